//! Conversation store tests

use wayfarer_core::error::Error;
use wayfarer_core::orchestration::{Conversation, Message, ToolCallRequest};
use wayfarer_core::session::{ConversationStore, FileStore, MemoryStore};

fn sample(thread_id: &str, text: &str) -> Conversation {
    let mut conversation = Conversation::new(thread_id);
    conversation.push(Message::human(text)).unwrap();
    conversation
        .push(Message::assistant_with_tool_calls(
            "",
            vec![ToolCallRequest::new("c1", "weather_check", serde_json::json!({"location": "Perth"}))],
        ))
        .unwrap();
    conversation
        .push(Message::tool_result("c1", "weather_check", r#"{"condition":"Sunny"}"#))
        .unwrap();
    conversation.push(Message::assistant("Pack sunscreen.")).unwrap();
    conversation
}

mod file_store_tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let conversation = sample("trip-1", "Plan Perth");
        store.save(&conversation).unwrap();

        let loaded = store.load("trip-1").unwrap().unwrap();
        assert_eq!(loaded.thread_id, "trip-1");
        assert_eq!(loaded.messages(), conversation.messages());
        assert!(dir.path().join("trip-1.json").exists());
    }

    #[test]
    fn test_missing_thread_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save(&sample("older", "Plan Perth")).unwrap();
        let mut newer = sample("newer", "Plan Hobart");
        newer.push(Message::human("And a day trip?")).unwrap();
        store.save(&newer).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|c| c.thread_id).collect();
        assert_eq!(ids, vec!["newer".to_string(), "older".to_string()]);
    }

    #[test]
    fn test_list_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save(&sample("good", "Plan Perth")).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].thread_id, "good");
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save(&sample("trip-1", "Plan Perth")).unwrap();

        assert!(store.delete("trip-1").unwrap());
        assert!(!store.delete("trip-1").unwrap());
        assert!(store.load("trip-1").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_thread_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for id in ["../escape", "a/b", ".hidden", ""] {
            assert!(matches!(store.load(id), Err(Error::Session(_))), "{id}");
        }
    }
}

mod memory_store_tests {
    use super::*;

    #[test]
    fn test_save_load_delete() {
        let store = MemoryStore::new();
        store.save(&sample("t1", "Plan Perth")).unwrap();

        assert_eq!(store.load("t1").unwrap().unwrap().len(), 4);
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.delete("t1").unwrap());
        assert!(store.load("t1").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let store = MemoryStore::new();
        let mut conversation = sample("t1", "Plan Perth");
        store.save(&conversation).unwrap();

        conversation.push(Message::human("Thanks")).unwrap();
        store.save(&conversation).unwrap();

        assert_eq!(store.load("t1").unwrap().unwrap().len(), 5);
    }
}
