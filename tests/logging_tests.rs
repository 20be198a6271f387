//! End-to-end tests of the logging calls over an in-memory sink

use std::sync::Arc;

use shmlog::{
    format::LINE_CAPACITY, CaptureBuffer, Console, ContextFlags, ContextHandle, DumpFormat,
    KvPair, Level, LogConfig, LogError, MemorySink, MsgFlags, SharedLog,
};
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    log: SharedLog,
    sink: Arc<MemorySink>,
    stderr: CaptureBuffer,
    stdout: CaptureBuffer,
}

fn harness() -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(MemorySink::new());
    let (console, stderr, stdout) = Console::capture();
    let log = SharedLog::builder(LogConfig::in_directory(dir.path()).with_library_path(dir.path()))
        .sink(Arc::clone(&sink))
        .console(console)
        .loader(|_: &SharedLog| true)
        .attach()
        .unwrap();
    Harness {
        _dir: dir,
        log,
        sink,
        stderr,
        stdout,
    }
}

impl Harness {
    fn context(&self, name: &str, level: Level) -> ContextHandle {
        let ctx = self.log.get_context(Some(name)).unwrap();
        self.log.set_level(ctx, Some(level)).unwrap();
        self.sink.take();
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_with_pairs() {
        let h = harness();
        let ctx = h.context("svc", Level::Info);

        h.log
            .msg(
                ctx,
                Level::Info,
                MsgFlags::NONE,
                Some("START"),
                &[KvPair::new("port", 80i64), KvPair::new("host", "a\"b")],
                Some("up"),
            )
            .unwrap();

        assert_eq!(
            h.sink.records(),
            vec![(
                Level::Info,
                "[] shmlog svc START {\"port\":80,\"host\":\"a\\\"b\"} up".to_string()
            )]
        );
    }

    #[test]
    fn test_msg_without_pairs_gets_empty_object() {
        let h = harness();
        let ctx = h.context("svc", Level::Info);

        h.log
            .msg(ctx, Level::Notice, MsgFlags::NONE, Some("PLAIN"), &[], Some("text only"))
            .unwrap();
        assert_eq!(h.sink.lines(), vec!["[] shmlog svc PLAIN {} text only"]);
    }

    #[test]
    fn test_msg_with_clock() {
        let h = harness();
        let ctx = h.context("svc", Level::Info);

        h.log
            .msg(
                ctx,
                Level::Info,
                MsgFlags::WITH_CLOCK,
                Some("TICK"),
                &[KvPair::new("n", 1u32)],
                None,
            )
            .unwrap();

        let lines = h.sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[] shmlog svc TICK {\"n\":1,\"CLOCK\":\""));
        assert!(lines[0].ends_with("\"} "));
    }

    #[test]
    fn test_level_gating() {
        let h = harness();
        let ctx = h.context("gate", Level::Warning);

        assert!(matches!(
            h.log.print(ctx, Level::Info, "quiet"),
            Err(LogError::LevelDisabled)
        ));
        assert!(h.sink.is_empty());

        h.log.print(ctx, Level::Error, "loud").unwrap();
        assert_eq!(h.sink.records(), vec![(Level::Error, "[] shmlog gate  loud".to_string())]);

        h.log.set_level(ctx, None).unwrap();
        assert!(matches!(
            h.log.print(ctx, Level::Emergency, "off"),
            Err(LogError::LevelDisabled)
        ));
    }

    #[test]
    fn test_invalid_handle() {
        let h = harness();
        let bogus = {
            let other = harness();
            let mut last = ContextHandle::GLOBAL;
            for i in 0..4 {
                last = other.log.get_context(Some(&format!("c{}", i))).unwrap();
            }
            last
        };
        assert!(matches!(
            h.log.print(bogus, Level::Error, "x"),
            Err(LogError::InvalidContext)
        ));
    }

    #[test]
    fn test_msgid_defects() {
        let h = harness();
        let ctx = h.context("ids", Level::Info);

        let err = h
            .log
            .msg(ctx, Level::Info, MsgFlags::NONE, Some("a b"), &[], None)
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidMsgId));

        let long = "A".repeat(32);
        let err = h
            .log
            .msg(ctx, Level::Info, MsgFlags::NONE, Some(&long), &[], None)
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidMsgId));

        let err = h
            .log
            .msg(ctx, Level::Info, MsgFlags::NONE, None, &[], None)
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidMsgId));

        let records = h.sink.take();
        assert_eq!(records.len(), 3);
        assert!(records[0].1.starts_with("[] shmlog ids INVALID_MSGID {\"MSGID\":\"a b\"}"));
        assert!(records[1].1.contains("LONG_MSGID"));
        assert!(records[2].1.contains("NULL_MSGID"));
        assert!(records.iter().all(|(level, _)| *level == Level::Error));
    }

    #[test]
    fn test_empty_msgid_is_reported_with_excerpt() {
        let h = harness();
        let ctx = h.context("ids", Level::Info);

        let err = h
            .log
            .msg(ctx, Level::Info, MsgFlags::NONE, Some(""), &[], Some("hello"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));

        let records = h.sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].1.contains("EMPTY_MSGID {\"MESSAGE\":\"{} hello ...\"}"));
    }

    #[test]
    fn test_key_count_mismatch() {
        let h = harness();
        let ctx = h.context("kv", Level::Info);

        let err = h
            .log
            .msg_kv(ctx, Level::Info, MsgFlags::NONE, Some("ID"), 2, "a", "{\"a\":%d}", "{\"a\":1} ")
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));

        let lines = h.sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("MISMATCHED_KEYS {\"MSGID\":\"ID\",\"KV_COUNT\":2,\"KEYS\":1}"));
        assert!(lines[1].contains("MISMATCHED_FMT {\"MSGID\":\"ID\"}"));
    }

    #[test]
    fn test_format_conversion_mismatch() {
        let h = harness();
        let ctx = h.context("kv", Level::Info);

        let err = h
            .log
            .msg_kv(
                ctx,
                Level::Info,
                MsgFlags::NONE,
                Some("ID"),
                2,
                "a\u{1}b",
                "{\"a\":%d}",
                "{\"a\":1} ",
            )
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));
        assert_eq!(h.sink.len(), 1);
        assert!(h.sink.lines()[0].contains("MISMATCHED_FMT"));
    }

    #[test]
    fn test_msg_kv_dispatches_rendered_line() {
        let h = harness();
        let ctx = h.context("kv", Level::Info);

        h.log
            .msg_kv(
                ctx,
                Level::Warning,
                MsgFlags::NONE,
                Some("DISK"),
                2,
                "dev\u{1}free",
                "{\"dev\":\"%s\",\"free\":%d}",
                "{\"dev\":\"sda\",\"free\":12} almost full",
            )
            .unwrap();
        assert_eq!(
            h.sink.records(),
            vec![(
                Level::Warning,
                "[] shmlog kv DISK {\"dev\":\"sda\",\"free\":12} almost full".to_string()
            )]
        );
    }

    #[test]
    fn test_malformed_object_rejected() {
        let h = harness();
        let ctx = h.context("json", Level::Info);

        let err = h
            .log
            .msg_kv(ctx, Level::Info, MsgFlags::NONE, Some("ID"), 1, "a", "{\"a\":%d}", "{\"a\":1 oops")
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));

        let lines = h.sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INVALID_JSON {\"MSGID\":\"ID\", \"CAUSE\":\"The json string is wrong.\""));
    }

    #[test]
    fn test_debug_rules() {
        let h = harness();
        let ctx = h.context("dbg", Level::Debug);

        h.log
            .msg(ctx, Level::Debug, MsgFlags::NONE, None, &[], Some("trace"))
            .unwrap();
        assert_eq!(
            h.sink.take(),
            vec![(Level::Debug, "[] shmlog dbg DBGMSG {} trace".to_string())]
        );

        let err = h
            .log
            .msg(ctx, Level::Debug, MsgFlags::NONE, Some("ID"), &[], Some("x"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));
        assert!(h.sink.take()[0].1.contains("DBGLVL_MSGID {\"MSGID\":\"ID\"}"));

        let err = h
            .log
            .msg(ctx, Level::Debug, MsgFlags::NONE, None, &[KvPair::new("k", 1i32)], None)
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));
        assert!(h.sink.take()[0].1.contains("DBGLVL_KVCOUNT"));

        let err = h
            .log
            .log_string(ctx, Level::Debug, None, Some("{}"), Some("x"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));
        assert!(h.sink.take()[0].1.contains("DBGLVL_KVPAIRS"));

        let err = h.log.log_string(ctx, Level::Debug, None, None, None).unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));
        assert!(h.sink.take()[0].1.contains("INVALID_FREESTRING"));
    }

    #[test]
    fn test_long_line_truncated_and_reported() {
        let h = harness();
        let ctx = h.context("big", Level::Info);
        let text = "x".repeat(4000);

        h.log
            .msg(ctx, Level::Info, MsgFlags::NONE, Some("BIG"), &[], Some(&text))
            .unwrap();

        let records = h.sink.records();
        assert_eq!(records.len(), 2);

        let (level, warning) = &records[0];
        assert_eq!(*level, Level::Warning);
        assert!(warning.contains("MSG_TRUNCATED {\"MSGID\":\"BIG\""));
        assert!(warning.len() < LINE_CAPACITY);

        let prefix = "[] shmlog big BIG ";
        let (level, line) = &records[1];
        assert_eq!(*level, Level::Info);
        assert!(line.starts_with("[] shmlog big BIG {} xxx"));
        assert_eq!(line.len(), prefix.len() + LINE_CAPACITY - 1);
    }

    #[test]
    fn test_log_string() {
        let h = harness();
        let ctx = h.context("str", Level::Info);

        h.log
            .log_string(ctx, Level::Info, Some("ID"), Some("{\"a\":[1,2]}"), Some("tail"))
            .unwrap();
        h.log
            .log_string(ctx, Level::Info, Some("ID"), None, Some("bare"))
            .unwrap();
        assert_eq!(
            h.sink.take().into_iter().map(|(_, l)| l).collect::<Vec<_>>(),
            vec![
                "[] shmlog str ID {\"a\":[1,2]} tail".to_string(),
                "[] shmlog str ID {} bare".to_string(),
            ]
        );

        let err = h
            .log
            .log_string(ctx, Level::Info, Some("ID"), Some("{\"a\":"), Some("tail"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidFormat));
        assert!(h.sink.take()[0].1.contains("INVALID_JSON"));
    }

    #[test]
    fn test_print() {
        let h = harness();
        let ctx = h.context("pr", Level::Info);

        h.log.print(ctx, Level::Info, "hello world").unwrap();
        assert_eq!(h.sink.lines(), vec!["[] shmlog pr  hello world"]);
        assert!(matches!(
            h.log.print(ctx, Level::Info, ""),
            Err(LogError::InvalidFormat)
        ));
    }

    #[test]
    fn test_dump_data() {
        let h = harness();
        let ctx = h.context("dump", Level::Info);
        let data: Vec<u8> = (0x40..0x54).collect();

        h.log
            .dump_data(ctx, Level::Info, &data, DumpFormat::default())
            .unwrap();

        let lines = h.sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[] shmlog dump  00000000  40 41 42"));
        assert!(lines[0].ends_with("|@ABCDEFGHIJKLMNO|"));
        assert!(lines[1].starts_with("[] shmlog dump  00000010  50 51 52 53"));
        assert!(lines[1].ends_with("|PQRS|"));

        assert!(matches!(
            h.log.dump_data(ctx, Level::Info, &[], DumpFormat::default()),
            Err(LogError::NoData)
        ));
    }

    #[test]
    fn test_ids_in_line_prefix() {
        let h = harness();
        let ctx = h.context("ids", Level::Info);
        h.log
            .set_flags(ctx, ContextFlags::LOG_PROCESS_IDS, true)
            .unwrap();

        h.log.print(ctx, Level::Info, "x").unwrap();
        let pid = std::process::id();
        assert_eq!(h.sink.lines(), vec![format!("[{}] shmlog ids  x", pid)]);
    }

    #[test]
    fn test_console_mirror() {
        let h = harness();
        let ctx = h.context("con", Level::Debug);
        h.log
            .set_flags(ctx, ContextFlags::LOG_TO_CONSOLE, true)
            .unwrap();

        h.log.print(ctx, Level::Error, "to stderr").unwrap();
        h.log.print(ctx, Level::Info, "to stdout").unwrap();

        assert!(h.stderr.contents().ends_with(" [] con to stderr\n"));
        assert!(!h.stderr.contents().contains("to stdout"));
        assert!(h.stdout.contents().ends_with(" [] con to stdout\n"));
        assert!(!h.stdout.contents().contains("to stderr"));
        assert_eq!(h.sink.len(), 2);
    }

    #[test]
    fn test_loadconf_command_propagates_global_flags() {
        let h = harness();
        let plain = h.context("plain", Level::Info);
        let pinned = h.context("pinned", Level::Info);
        h.log
            .set_flags(pinned, ContextFlags::LOG_THREAD_IDS, true)
            .unwrap();
        h.log
            .set_flags(ContextHandle::GLOBAL, ContextFlags::LOG_PROCESS_IDS, true)
            .unwrap();

        h.log
            .print(ContextHandle::GLOBAL, Level::Info, "!loglib loadconf")
            .unwrap();
        assert!(h.sink.is_empty());

        assert!(h.log.flags(plain).unwrap().contains(ContextFlags::LOG_PROCESS_IDS));
        let pinned_flags = h.log.flags(pinned).unwrap();
        assert!(!pinned_flags.contains(ContextFlags::LOG_PROCESS_IDS));
        assert!(pinned_flags.contains(ContextFlags::LOG_THREAD_IDS));
    }

    #[test]
    fn test_is_enabled() {
        let h = harness();
        let ctx = h.context("en", Level::Notice);
        assert!(h.log.is_enabled(ctx, Level::Notice));
        assert!(h.log.is_enabled(ctx, Level::Critical));
        assert!(!h.log.is_enabled(ctx, Level::Info));
    }
}
