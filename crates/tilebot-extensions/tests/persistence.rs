// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::rc::Rc;
use tempfile::tempdir;
use tilebot_core::state::paths;
use tilebot_core::{
    ApplicationState, Direction, EngineConfig, Extension, ExtensionContext, GameBus, GameEvent,
    Hero, MapData, ObservableState, Surface, TileType,
};
use tilebot_extensions::grid::CELL_ROLE;
use tilebot_extensions::{
    DirectoryStore, GridExtension, HeroExtension, MapStore, NotificationExtension,
    PersistenceExtension,
};

struct Harness {
    state: ObservableState,
    bus: GameBus,
    surface: Surface,
    config: Rc<EngineConfig>,
}

impl Harness {
    fn new(app: ApplicationState) -> Self {
        Self {
            state: ObservableState::from_application(&app).unwrap(),
            bus: GameBus::new(),
            surface: Surface::new(),
            config: Rc::new(EngineConfig::default()),
        }
    }

    fn install<E: Extension>(&self, mut extension: E) -> E {
        let ctx = ExtensionContext::new(
            extension.name(),
            self.state.clone(),
            self.bus.clone(),
            self.surface.clone(),
            self.config.clone(),
        );
        extension.init(&ctx).unwrap();
        extension
    }

    fn alerts(&self) -> Vec<String> {
        self.state.get_as(paths::ALERTS).unwrap()
    }
}

fn stored_level() -> MapData {
    MapData::blank(3, 2)
        .with_type("A", TileType::default().pickable())
        .with_cell(2, 1, "A")
}

#[test]
fn loading_a_stored_map_replaces_state_and_resets_the_hero() {
    let dir = tempdir().unwrap();
    let mut store = DirectoryStore::new(dir.path());
    assert!(store.save_map("level1", &stored_level()).success);

    let harness = Harness::new(ApplicationState {
        map_data: MapData::blank(5, 5),
        hero: Hero::at(4, 4, Direction::Up),
        ..ApplicationState::default()
    });
    let _notifications = harness.install(NotificationExtension::new());
    let _grid = harness.install(GridExtension::new());
    let _hero = harness.install(HeroExtension::default());
    let persistence = harness.install(PersistenceExtension::new(store));

    let listed: Vec<String> = harness.state.get_as(paths::STORE_MAPS).unwrap();
    assert_eq!(listed, ["level1"]);

    harness.bus.emit(GameEvent::MapLoad {
        name: "level1".into(),
    });

    assert!(persistence.last_response().is_some_and(|r| r.success));
    assert_eq!(harness.state.map_data().unwrap(), stored_level());
    // The spawn cell (4, 4) is clamped into the 3x2 map.
    assert_eq!(harness.state.hero().unwrap().cell(), (2, 1));
    assert_eq!(harness.surface.nodes_with_role(CELL_ROLE).len(), 1);
    assert!(harness.alerts().is_empty());
}

#[test]
fn failed_load_alerts_and_keeps_the_map() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(ApplicationState {
        map_data: MapData::blank(2, 2),
        ..ApplicationState::default()
    });
    let _notifications = harness.install(NotificationExtension::new());
    let _persistence = harness.install(PersistenceExtension::new(DirectoryStore::new(dir.path())));

    harness.bus.emit(GameEvent::MapLoad {
        name: "missing".into(),
    });

    assert_eq!(harness.state.map_data().unwrap(), MapData::blank(2, 2));
    assert_eq!(harness.alerts(), ["no map named 'missing'"]);
}

#[test]
fn malformed_import_is_rejected() {
    let harness = Harness::new(ApplicationState {
        map_data: MapData::blank(2, 2),
        ..ApplicationState::default()
    });
    let _notifications = harness.install(NotificationExtension::new());
    let _persistence = harness.install(PersistenceExtension::new(
        tilebot_extensions::MemoryStore::new(),
    ));

    harness.bus.emit(GameEvent::MapImport {
        json: "{ not json".into(),
    });
    harness.bus.emit(GameEvent::MapImport {
        json: r#"{"map": []}"#.into(),
    });

    assert_eq!(harness.state.map_data().unwrap(), MapData::blank(2, 2));
    assert_eq!(harness.alerts().len(), 2);

    harness.bus.emit(GameEvent::MapImport {
        json: r#"{"itemTypes": {}, "map": [[0, 0, 0]]}"#.into(),
    });
    assert_eq!(harness.state.map_data().unwrap().width(), 3);
}

#[test]
fn homework_save_load_and_submit() {
    let dir = tempdir().unwrap();
    let mut app = ApplicationState {
        map_data: stored_level(),
        ..ApplicationState::default()
    };
    app.program.code = "right\nright".into();
    let harness = Harness::new(app);
    let _notifications = harness.install(NotificationExtension::new());
    let _persistence = harness.install(PersistenceExtension::new(DirectoryStore::new(dir.path())));

    harness.bus.emit(GameEvent::HomeworkSave {
        name: "week1".into(),
    });
    let listed: Vec<String> = harness.state.get_as(paths::STORE_HOMEWORK).unwrap();
    assert_eq!(listed, ["week1"]);

    harness.state.set_program_code("").unwrap();
    harness.state.set_map_data(&MapData::blank(1, 1)).unwrap();
    harness.bus.emit(GameEvent::HomeworkLoad {
        name: "week1".into(),
    });
    assert_eq!(harness.state.program_code().unwrap(), "right\nright");
    assert_eq!(harness.state.map_data().unwrap(), stored_level());

    harness.bus.emit(GameEvent::HomeworkSubmit {
        name: "week1".into(),
        student: "ada".into(),
    });
    assert!(dir.path().join("submissions/week1/ada.json").is_file());
    assert!(harness.alerts().is_empty());
}
