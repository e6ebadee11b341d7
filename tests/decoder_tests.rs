mod common;

use common::{
    cswitch_payload, process_start_payload, sample_prof_payload, set_name_payload, stack_payload,
    thread_start_payload, TraceWriter,
};
use etltrace::catalog::{self, providers, Guid, SchemaFlavor};
use etltrace::decoder::{EventDecoder, FieldValue};
use etltrace::reader::TraceFile;
use etltrace::utils::error::DecodeError;
use pretty_assertions::assert_eq;

fn decode_single(writer: &TraceWriter, flavor: SchemaFlavor) -> etltrace::decoder::TypedEvent {
    let trace = TraceFile::from_bytes(writer.finish()).unwrap();
    let decoder = EventDecoder::new(catalog::catalog(flavor), trace.header().pointer_size);
    let record = trace.records().next().unwrap().unwrap();
    decoder.decode(&record).unwrap()
}

#[test]
fn test_cswitch_round_trip() {
    let mut writer = TraceWriter::new();
    writer.push_record(providers::THREAD, providers::OP_CSWITCH, 2, 1_500, cswitch_payload(1644, 4532));
    let event = decode_single(&writer, SchemaFlavor::Native);

    assert_eq!(event.name, "MSNT_SystemTrace/Thread/CSwitch");
    assert_eq!(event.cpu, 2);
    assert_eq!(event.timestamp, 1_500);
    assert!(!event.is_unknown());
    assert_eq!(event.field("NewThreadId"), Some(&FieldValue::U32(1644)));
    assert_eq!(event.field("OldThreadId"), Some(&FieldValue::U32(4532)));
    assert_eq!(event.field("NewThreadPriority"), Some(&FieldValue::I8(8)));
    assert_eq!(event.field("OldThreadState"), Some(&FieldValue::I8(1)));
}

#[test]
fn test_xperf_flavor_changes_name_only() {
    let mut writer = TraceWriter::new();
    writer.push_record(providers::THREAD, providers::OP_CSWITCH, 0, 1_500, cswitch_payload(1, 2));
    let event = decode_single(&writer, SchemaFlavor::Xperf);
    assert_eq!(event.name, "CSwitch");
    assert_eq!(event.field("NewThreadId"), Some(&FieldValue::U32(1)));
}

#[test]
fn test_thread_start_wide_string_name() {
    let mut writer = TraceWriter::new();
    writer.push_record(
        providers::THREAD,
        providers::OP_START,
        0,
        1_200,
        thread_start_payload(4532, 17524, 0x7ff6_0000_1000, "MediaCache"),
    );
    let event = decode_single(&writer, SchemaFlavor::Native);

    assert_eq!(event.name, "MSNT_SystemTrace/Thread/Start");
    assert_eq!(event.field("ProcessId"), Some(&FieldValue::U32(4532)));
    assert_eq!(event.field("TThreadId"), Some(&FieldValue::U32(17524)));
    assert_eq!(
        event.field("Win32StartAddr"),
        Some(&FieldValue::Pointer(0x7ff6_0000_1000))
    );
    assert_eq!(
        event.field("ThreadName").and_then(FieldValue::as_str),
        Some("MediaCache")
    );
    assert_eq!(event.thread_id(), Some(17524));
    assert_eq!(event.process_id(), Some(4532));
}

#[test]
fn test_process_start_ansi_string() {
    let mut writer = TraceWriter::new();
    writer.push_record(
        providers::PROCESS,
        providers::OP_START,
        0,
        1_300,
        process_start_payload(0xffff_8000_1234, 4532, 1000, 1, 0, "firefox.exe"),
    );
    let event = decode_single(&writer, SchemaFlavor::Native);

    assert_eq!(event.name, "MSNT_SystemTrace/Process/Start");
    assert_eq!(
        event.field("ImageFileName").and_then(FieldValue::as_str),
        Some("firefox.exe")
    );
    assert_eq!(event.field("ExitStatus"), Some(&FieldValue::I32(0)));
}

#[test]
fn test_stack_walk_pointer_array() {
    let frames = [0xffff_f800_0000_1000, 0x7ff6_0000_2000, 0x7ff6_0000_3000];
    let mut writer = TraceWriter::new();
    writer.push_record(
        providers::STACK_WALK,
        providers::OP_STACK,
        1,
        1_600,
        stack_payload(1_590, 4532, 17524, &frames),
    );
    let event = decode_single(&writer, SchemaFlavor::Native);

    assert_eq!(event.field("EventTimeStamp"), Some(&FieldValue::U64(1_590)));
    assert_eq!(
        event.field("Stack").and_then(FieldValue::as_pointer_array),
        Some(&frames[..])
    );
    assert_eq!(event.thread_id(), Some(17524));
}

#[test]
fn test_32bit_capture_pointer_width() {
    let mut writer = TraceWriter::new().with_pointer_size(4);
    // SampleProf on a 32-bit capture: 4-byte instruction pointer
    let mut payload = Vec::new();
    payload.extend_from_slice(&0x8040_1000u32.to_le_bytes());
    payload.extend_from_slice(&17524u32.to_le_bytes());
    payload.extend_from_slice(&1u32.to_le_bytes());
    writer.push_record(providers::PERF_INFO, providers::OP_SAMPLE_PROF, 0, 1_700, payload);

    let event = decode_single(&writer, SchemaFlavor::Native);
    assert_eq!(
        event.field("InstructionPointer"),
        Some(&FieldValue::Pointer(0x8040_1000))
    );
    assert_eq!(event.field("ThreadId"), Some(&FieldValue::U32(17524)));
}

#[test]
fn test_unknown_provider_falls_back_to_raw() {
    let bogus = Guid::from_fields(0x12345678, 0x9abc, 0xdef0, [1, 2, 3, 4, 5, 6, 7, 8]);
    let mut writer = TraceWriter::new();
    writer.push_record(bogus, 42, 0, 1_800, vec![0xde, 0xad, 0xbe, 0xef]);

    let event = decode_single(&writer, SchemaFlavor::Native);
    assert!(event.is_unknown());
    assert!(event.name.starts_with("Unknown("));
    assert_eq!(event.raw_payload.as_deref(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
    assert!(event.fields.is_empty());
}

#[test]
fn test_short_payload_is_truncated_error() {
    let mut writer = TraceWriter::new();
    let mut payload = cswitch_payload(1, 2);
    payload.truncate(6);
    writer.push_record(providers::THREAD, providers::OP_CSWITCH, 0, 1_900, payload);

    let trace = TraceFile::from_bytes(writer.finish()).unwrap();
    let decoder = EventDecoder::new(catalog::catalog(SchemaFlavor::Native), 8);
    let record = trace.records().next().unwrap().unwrap();
    assert!(matches!(
        decoder.decode(&record),
        Err(DecodeError::Truncated { .. })
    ));
}

#[test]
fn test_trailing_bytes_are_an_error() {
    let mut writer = TraceWriter::new();
    let mut payload = cswitch_payload(1, 2);
    payload.extend_from_slice(&[0, 0, 0, 0]);
    writer.push_record(providers::THREAD, providers::OP_CSWITCH, 0, 2_000, payload);

    let trace = TraceFile::from_bytes(writer.finish()).unwrap();
    let decoder = EventDecoder::new(catalog::catalog(SchemaFlavor::Native), 8);
    let record = trace.records().next().unwrap().unwrap();
    assert!(matches!(
        decoder.decode(&record),
        Err(DecodeError::TrailingBytes { .. })
    ));
}

#[test]
fn test_unterminated_ansi_string_is_an_error() {
    let mut writer = TraceWriter::new();
    let mut payload = process_start_payload(0, 1, 2, 3, 0, "truncated");
    payload.pop(); // drop the NUL
    writer.push_record(providers::PROCESS, providers::OP_START, 0, 2_100, payload);

    let trace = TraceFile::from_bytes(writer.finish()).unwrap();
    let decoder = EventDecoder::new(catalog::catalog(SchemaFlavor::Native), 8);
    let record = trace.records().next().unwrap().unwrap();
    assert!(matches!(
        decoder.decode(&record),
        Err(DecodeError::UnterminatedString(_))
    ));
}

#[test]
fn test_set_name_round_trip() {
    let mut writer = TraceWriter::new();
    writer.push_record(
        providers::THREAD,
        providers::OP_SET_NAME,
        0,
        2_200,
        set_name_payload(4532, 17524, "Compositor"),
    );
    let event = decode_single(&writer, SchemaFlavor::Native);
    assert_eq!(event.name, "MSNT_SystemTrace/Thread/SetName");
    assert_eq!(
        event.field("ThreadName").and_then(FieldValue::as_str),
        Some("Compositor")
    );
}

#[test]
fn test_sample_prof_round_trip() {
    let mut writer = TraceWriter::new();
    writer.push_record(
        providers::PERF_INFO,
        providers::OP_SAMPLE_PROF,
        3,
        2_300,
        sample_prof_payload(0xffff_f800_0000_2000, 17524, 1),
    );
    let event = decode_single(&writer, SchemaFlavor::Native);
    assert_eq!(event.name, "MSNT_SystemTrace/PerfInfo/SampleProf");
    assert_eq!(
        event.field("InstructionPointer"),
        Some(&FieldValue::Pointer(0xffff_f800_0000_2000))
    );
    assert_eq!(event.field("Count"), Some(&FieldValue::U32(1)));
}
