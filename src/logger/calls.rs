//! The logging calls

use crate::{
    dispatch::check_enabled,
    error::{LogError, Result},
    format::{
        hex_lines,
        kv::{format_template, key_list, monotonic_clock, serialize_pairs},
        truncate_and_escape, validate_embedded_object, validate_format, validate_keys,
        validate_msgid, BoundedLine, DumpFormat, JsonDefect, KvPair, MsgFlags, MsgIdDefect,
        DEBUG_MSG_ID, EMPTY_OBJECT,
    },
    labels::Level,
    registry::{ContextHandle, ContextRecord},
};

use super::SharedLog;

impl SharedLog {
    /// Log a structured message built from typed pairs
    ///
    /// The line is `<object> <text>`; with `MsgFlags::WITH_CLOCK` a
    /// monotonic `CLOCK` field follows the caller's pairs. At debug level
    /// `msgid` must be `None` and `pairs` empty.
    pub fn msg(
        &self,
        ctx: ContextHandle,
        level: Level,
        flags: MsgFlags,
        msgid: Option<&str>,
        pairs: &[KvPair<'_>],
        text: Option<&str>,
    ) -> Result<()> {
        let record = self.enabled_record(ctx, level)?;

        let text = text.unwrap_or("");
        let rendered = if pairs.is_empty() {
            text.to_string()
        } else {
            let clock = flags.contains(MsgFlags::WITH_CLOCK).then(monotonic_clock);
            format!("{} {}", serialize_pairs(pairs, clock.as_deref()), text)
        };

        self.log_kv(
            record,
            level,
            flags,
            msgid,
            pairs.len(),
            &key_list(pairs),
            &format_template(pairs, flags),
            &rendered,
        )
    }

    /// Log a message the caller already rendered
    ///
    /// `keys` holds `kv_count` SOH-separated keys and `formats` the printf
    /// template `rendered` was produced from; both are checked against
    /// `kv_count`. `rendered` is `<object> <free text>`, or just the free
    /// text when `kv_count` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn msg_kv(
        &self,
        ctx: ContextHandle,
        level: Level,
        flags: MsgFlags,
        msgid: Option<&str>,
        kv_count: usize,
        keys: &str,
        formats: &str,
        rendered: &str,
    ) -> Result<()> {
        let record = self.enabled_record(ctx, level)?;
        self.log_kv(record, level, flags, msgid, kv_count, keys, formats, rendered)
    }

    /// Log a pre-serialized payload and free text
    pub fn log_string(
        &self,
        ctx: ContextHandle,
        level: Level,
        msgid: Option<&str>,
        kvpairs: Option<&str>,
        message: Option<&str>,
    ) -> Result<()> {
        let record = self.enabled_record(ctx, level)?;
        let mut empty_msgid = false;
        let mut dispatch_id = msgid;

        if level != Level::Debug {
            empty_msgid = self.check_msgid(record, msgid)?;

            if let Some(kvpairs) = kvpairs {
                if let Err(defect) = validate_embedded_object(kvpairs, false) {
                    return Err(self.invalid_json(record, msgid, kvpairs, defect));
                }
            }
        } else {
            self.check_debug_msgid(record, msgid)?;
            if kvpairs.is_some() {
                self.diag_for(
                    record,
                    Level::Error,
                    format_args!("DBGLVL_KVPAIRS {{}} kvpairs should be NULL for DEBUG level"),
                );
                return Err(LogError::InvalidFormat);
            }
            if message.is_none() {
                self.diag_for(record, Level::Error, format_args!("INVALID_FREESTRING {{}} "));
                return Err(LogError::InvalidFormat);
            }
            dispatch_id = Some(DEBUG_MSG_ID);
        }

        let line = BoundedLine::from_parts(&[
            kvpairs.unwrap_or(EMPTY_OBJECT),
            " ",
            message.unwrap_or(""),
        ]);
        self.report_truncation(record, msgid, &line);

        if empty_msgid {
            return Err(self.empty_msgid(record, &line));
        }

        self.write(record, level, dispatch_id, line.as_str())
    }

    /// Log free text without a message id
    pub fn print(&self, ctx: ContextHandle, level: Level, text: &str) -> Result<()> {
        let record = self.enabled_record(ctx, level)?;
        if text.is_empty() {
            return Err(LogError::InvalidFormat);
        }

        let line = BoundedLine::from_parts(&[text]);
        if line.truncated() {
            log::debug!("print line truncated for {}", record.name());
        }
        self.write(record, level, None, line.as_str())
    }

    /// Log binary data as a hex dump, one line per 16 bytes
    pub fn dump_data(
        &self,
        ctx: ContextHandle,
        level: Level,
        data: &[u8],
        format: DumpFormat,
    ) -> Result<()> {
        let record = self.enabled_record(ctx, level)?;
        if data.is_empty() {
            return Err(LogError::NoData);
        }

        for line in hex_lines(data, format) {
            self.write(record, level, None, &line)?;
        }
        Ok(())
    }

    fn enabled_record(&self, ctx: ContextHandle, level: Level) -> Result<&ContextRecord> {
        let record = self.registry.resolve(ctx)?;
        check_enabled(level.code(), record.info.threshold())?;
        Ok(record)
    }

    #[allow(clippy::too_many_arguments)]
    fn log_kv(
        &self,
        record: &ContextRecord,
        level: Level,
        flags: MsgFlags,
        msgid: Option<&str>,
        kv_count: usize,
        keys: &str,
        formats: &str,
        rendered: &str,
    ) -> Result<()> {
        let mut empty_msgid = false;
        let mut dispatch_id = msgid;

        if level != Level::Debug {
            empty_msgid = self.check_msgid(record, msgid)?;

            if kv_count > 0 {
                let shown = truncate_and_escape(msgid.unwrap_or(""));
                if let Err(defect) = validate_keys(kv_count, keys) {
                    self.diag(Level::Error, record.name(), "[]", format_args!("{}", defect.diagnostic(&shown)));
                    return Err(self.mismatched_format(record, &shown));
                }
                if !validate_format(flags, kv_count, formats) {
                    return Err(self.mismatched_format(record, &shown));
                }
            }
        } else {
            self.check_debug_msgid(record, msgid)?;
            if kv_count > 0 {
                self.diag_for(
                    record,
                    Level::Error,
                    format_args!("DBGLVL_KVCOUNT {{}} kv_count should be 0 for DEBUG level"),
                );
                return Err(LogError::InvalidFormat);
            }
            dispatch_id = Some(DEBUG_MSG_ID);
        }

        let mut line = BoundedLine::new();
        if kv_count == 0 {
            line.push_str(EMPTY_OBJECT);
            line.push_str(" ");
        }
        line.push_str(rendered);
        self.report_truncation(record, msgid, &line);

        if empty_msgid {
            return Err(self.empty_msgid(record, &line));
        }

        if level != Level::Debug && kv_count > 0 {
            if let Err(defect) = validate_embedded_object(line.as_str(), true) {
                return Err(self.invalid_json(record, msgid, line.as_str(), defect));
            }
        }

        self.write(record, level, dispatch_id, line.as_str())
    }

    /// Check a non-debug message id; `Ok(true)` when it is empty
    fn check_msgid(&self, record: &ContextRecord, msgid: Option<&str>) -> Result<bool> {
        match validate_msgid(msgid) {
            Ok(()) => Ok(false),
            Err(MsgIdDefect::Empty) => Ok(true),
            Err(defect) => {
                if let Some(text) = defect.diagnostic(msgid) {
                    self.diag_for(record, Level::Error, format_args!("{}", text));
                }
                Err(defect.error())
            }
        }
    }

    fn check_debug_msgid(&self, record: &ContextRecord, msgid: Option<&str>) -> Result<()> {
        match msgid {
            Some(msgid) => {
                self.diag_for(
                    record,
                    Level::Error,
                    format_args!(
                        "DBGLVL_MSGID {{\"MSGID\":\"{}\"}} MSGID should be NULL for debug level",
                        truncate_and_escape(msgid)
                    ),
                );
                Err(LogError::InvalidFormat)
            }
            None => Ok(()),
        }
    }

    fn report_truncation(&self, record: &ContextRecord, msgid: Option<&str>, line: &BoundedLine) {
        if !line.truncated() {
            return;
        }
        self.diag_for(
            record,
            Level::Warning,
            format_args!(
                "MSG_TRUNCATED {{\"MSGID\":\"{}\",\"CAUSE\":\"Log message exceeded 1024 bytes\",\"TRUNCATED_MSG\":\"{} ...\"}}",
                truncate_and_escape(msgid.unwrap_or("NULL")),
                truncate_and_escape(line.as_str())
            ),
        );
    }

    fn empty_msgid(&self, record: &ContextRecord, line: &BoundedLine) -> LogError {
        self.diag_for(
            record,
            Level::Error,
            format_args!(
                "EMPTY_MSGID {{\"MESSAGE\":\"{} ...\"}} MSGID must not be empty",
                truncate_and_escape(line.as_str())
            ),
        );
        LogError::InvalidFormat
    }

    fn mismatched_format(&self, record: &ContextRecord, shown_msgid: &str) -> LogError {
        self.diag_for(
            record,
            Level::Error,
            format_args!("MISMATCHED_FMT {{\"MSGID\":\"{}\"}}", shown_msgid),
        );
        LogError::InvalidFormat
    }

    fn invalid_json(
        &self,
        record: &ContextRecord,
        msgid: Option<&str>,
        payload: &str,
        defect: JsonDefect,
    ) -> LogError {
        self.diag_for(
            record,
            Level::Error,
            format_args!(
                "INVALID_JSON {{\"MSGID\":\"{}\", \"CAUSE\":\"{}\",\"JSON\":\"{} ...\"}}",
                truncate_and_escape(msgid.unwrap_or("")),
                defect.cause(),
                truncate_and_escape(payload)
            ),
        );
        LogError::InvalidFormat
    }
}
