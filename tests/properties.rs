// tests/properties.rs

mod common;

use std::collections::BTreeSet;
use std::path::Path;

use proptest::prelude::*;

use common::{ConfigFileBuilder, CoreHarness, ROOT};
use taskexplorer::fs::mock::MockFileSystem;
use taskexplorer::parse::ParserRegistry;
use taskexplorer::types::TaskFormat;

// Target names that can never collide with make directives.
fn target_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("t_[a-z0-9]{1,6}", 1..=max)
        .prop_map(|set| set.into_iter().collect())
        .prop_shuffle()
}

fn makefile(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("{n}: deps\n\t@echo {n}\n\n"))
        .collect()
}

fn started(text: &str) -> CoreHarness {
    let fs = MockFileSystem::new();
    fs.add_file("/ws/Makefile", text);
    let config = ConfigFileBuilder::new().with_formats(&[TaskFormat::Make]).build();
    let mut h = CoreHarness::new(config, fs, &[ROOT]);
    h.start();
    h
}

proptest! {
    #[test]
    fn make_parse_is_deterministic_and_ordered(names in target_names(12)) {
        let registry = ParserRegistry::new().unwrap();
        let text = makefile(&names);
        let path = Path::new("/ws/Makefile");

        let first = registry.parse(TaskFormat::Make, path, &text).unwrap();
        let second = registry.parse(TaskFormat::Make, path, &text).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &names);

        // Positions point at the target name and grow with declaration order.
        let mut last = None;
        for name in &first {
            let pos = registry.document_position(TaskFormat::Make, name, &text);
            prop_assert!(text[pos..].starts_with(name.as_str()));
            if let Some(prev) = last {
                prop_assert!(pos > prev);
            }
            last = Some(pos);
        }
    }

    #[test]
    fn untouched_tasks_keep_their_identity(
        before in target_names(10),
        keep_mask in proptest::collection::vec(any::<bool>(), 10),
        added in target_names(4),
    ) {
        let mut h = started(&makefile(&before));
        prop_assert_eq!(h.core.map().visible_count(TaskFormat::Make), before.len());

        let kept: Vec<String> = before
            .iter()
            .zip(keep_mask.iter().chain(std::iter::repeat(&true)))
            .filter(|(_, keep)| **keep)
            .map(|(n, _)| n.clone())
            .collect();
        let mut after = kept.clone();
        for name in &added {
            if !after.contains(name) {
                after.push(name.clone());
            }
        }

        let kept_ids: Vec<_> = kept
            .iter()
            .map(|n| h.id(TaskFormat::Make, ROOT, "Makefile", n))
            .collect();

        h.write("/ws/Makefile", &makefile(&after));
        h.settle();

        // Count moves by exactly the net difference.
        prop_assert_eq!(h.core.map().visible_count(TaskFormat::Make), after.len());
        for id in &kept_ids {
            prop_assert!(h.core.map().contains(id));
        }

        let expected: BTreeSet<String> = after.iter().cloned().collect();
        let actual: BTreeSet<String> = h.names(TaskFormat::Make).into_iter().collect();
        prop_assert_eq!(actual, expected);

        // No delta may report a kept task as added or removed.
        for delta in h.deltas.iter().skip(1) {
            for file in &delta.files {
                for id in &kept_ids {
                    prop_assert!(!file.added.contains(id));
                    prop_assert!(!file.removed.contains(id));
                }
            }
        }
    }
}
