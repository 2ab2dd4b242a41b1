// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Document index behaviour observed through listeners

use std::sync::Arc;

use parking_lot::Mutex;
use sqlscope_engine::{
    DocumentAnalyzer, DocumentSyntaxContext, EngineConfig, ScriptItemListener, ScriptItemSyntaxContext,
};
use sqlscope_ir::{Dialect, Interval};
use sqlscope_test_utils::{ScriptFixtures, recognize_dummy};

/// Records every notification as `+offset`, `-offset` or `*`
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl ScriptItemListener for Recorder {
    fn on_script_item_invalidated(&self, offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {
        self.events.lock().push(format!("-{offset}"));
    }

    fn on_script_item_introduced(&self, offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {
        self.events.lock().push(format!("+{offset}"));
    }

    fn on_all_items_invalidated(&self) {
        self.events.lock().push("*".to_string());
    }
}

fn register(context: &DocumentSyntaxContext, text: &str, offset: usize) {
    let model = Arc::new(recognize_dummy(Dialect::Standard, text));
    context.register_script_item_context(text, model, offset, text.len(), false);
}

#[test]
fn test_analyzer_notifies_listeners() {
    let recorder = Arc::new(Recorder::default());
    let mut analyzer = DocumentAnalyzer::new(EngineConfig::for_dialect(Dialect::Standard));
    analyzer.context().add_listener(recorder.clone());

    analyzer.set_text(ScriptFixtures::three_statements());
    assert_eq!(recorder.take(), vec!["*", "+0", "+22", "+68"]);

    // typing inside the UPDATE replaces only that item
    analyzer.apply_edit(28, 0, " ").unwrap();
    assert_eq!(recorder.take(), vec!["-22", "+22"]);
    let offsets: Vec<_> = analyzer.context().script_items().iter().map(|i| i.offset).collect();
    assert_eq!(offsets, vec![0, 22, 69]);
}

#[test]
fn test_listener_may_query_the_context() {
    struct Counting {
        context: Arc<DocumentSyntaxContext>,
        seen: Mutex<Vec<usize>>,
    }

    impl ScriptItemListener for Counting {
        fn on_script_item_introduced(&self, _offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {
            self.seen.lock().push(self.context.len());
        }
    }

    let context = Arc::new(DocumentSyntaxContext::new());
    let listener = Arc::new(Counting {
        context: context.clone(),
        seen: Mutex::new(Vec::new()),
    });
    context.add_listener(listener.clone());
    register(&context, "SELECT a FROM t", 0);
    register(&context, "SELECT b FROM u", 20);
    assert_eq!(*listener.seen.lock(), vec![1, 2]);
}

#[test]
fn test_tokens_are_found_across_items() {
    let context = DocumentSyntaxContext::new();
    register(&context, "SELECT a FROM t", 0);
    register(&context, "SELECT bb FROM u", 20);

    let token = context.find_token(28).unwrap();
    assert_eq!(token.offset, 27);
    assert_eq!(token.token.length, 2);
    assert_eq!(token.script_item.offset, 20);
    assert!(context.find_token(17).is_none());
    assert!(context.find_script_item(17).is_none());
}

#[test]
fn test_drop_invisible_keeps_items_near_the_viewport() {
    let recorder = Arc::new(Recorder::default());
    let context = DocumentSyntaxContext::new();
    for offset in [0, 100, 200, 300] {
        register(&context, "SELECT a FROM t", offset);
    }
    context.add_listener(recorder.clone());

    let resident = context.drop_invisible_script_items(Interval::new(105, 210));
    assert_eq!((resident.start, resident.end), (100, 215));
    let offsets: Vec<_> = context.script_items().iter().map(|i| i.offset).collect();
    assert_eq!(offsets, vec![100, 200]);
    assert_eq!(recorder.take(), vec!["-0", "-300"]);
}

#[test]
fn test_deleted_listener_is_not_notified() {
    let recorder = Arc::new(Recorder::default());
    let context = DocumentSyntaxContext::new();
    let listener: Arc<dyn ScriptItemListener> = recorder.clone();
    context.add_listener(listener.clone());
    assert!(context.remove_listener(&listener));
    register(&context, "SELECT 1", 0);
    assert!(recorder.take().is_empty());
}
