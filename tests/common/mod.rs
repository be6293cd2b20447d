#![allow(dead_code)]

pub use taskexplorer_test_utils::builders::ConfigFileBuilder;
pub use taskexplorer_test_utils::harness::CoreHarness;
pub use taskexplorer_test_utils::{init_tracing, with_timeout};

use taskexplorer::fs::mock::MockFileSystem;

pub const ROOT: &str = "/ws";

/// A workspace with a Makefile and a package.json.
pub fn sample_workspace() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/ws/Makefile",
        "build:\n\tcc main.c\n\ntest: build\n\t./run-tests\n\nclean:\n\trm -f a.out\n",
    );
    fs.add_file(
        "/ws/package.json",
        r#"{ "name": "demo", "scripts": { "start": "node .", "lint": "eslint ." } }"#,
    );
    fs
}
