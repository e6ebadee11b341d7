//! Built-in schema table for the NT kernel logger providers.
//!
//! GUIDs are the well-known kernel logger provider GUIDs. Field layouts
//! follow the published event definitions for 64-bit captures of the
//! event versions the decoder supports; pointer-width fields are declared
//! as `Pointer` so 32-bit captures decode with the same table.

use super::schema::{field, EventSchema, Field, FieldKind, Guid};

/// EventTraceGuid - the trace header pseudo-provider
pub const EVENT_TRACE: Guid = Guid::from_fields(
    0x68fdd900,
    0x4a3e,
    0x11d1,
    [0x84, 0xf4, 0x00, 0x00, 0xf8, 0x04, 0x64, 0xe3],
);

/// Kernel process provider
pub const PROCESS: Guid = Guid::from_fields(
    0x3d6fa8d0,
    0xfe05,
    0x11d0,
    [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
);

/// Kernel thread provider (scheduling events live here)
pub const THREAD: Guid = Guid::from_fields(
    0x3d6fa8d1,
    0xfe05,
    0x11d0,
    [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
);

/// Kernel page fault / virtual memory provider
pub const PAGE_FAULT: Guid = Guid::from_fields(
    0x3d6fa8d3,
    0xfe05,
    0x11d0,
    [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
);

/// Kernel image load provider
pub const IMAGE: Guid = Guid::from_fields(
    0x2cb15d1d,
    0x5fc1,
    0x11d2,
    [0xab, 0xe1, 0x00, 0xa0, 0xc9, 0x11, 0xf5, 0x18],
);

/// PerfInfo provider (profile interrupts, collection control)
pub const PERF_INFO: Guid = Guid::from_fields(
    0xce1dbfb4,
    0x137e,
    0x4da6,
    [0x87, 0xb0, 0x3f, 0x59, 0xaa, 0x10, 0x2c, 0xbc],
);

/// StackWalk provider (call-stack snapshots)
pub const STACK_WALK: Guid = Guid::from_fields(
    0xdef2fe46,
    0x7bd6,
    0x4b80,
    [0xbd, 0x94, 0xf5, 0x7f, 0xe2, 0x0d, 0x0c, 0xe3],
);

/// Win32k provider (window manager events)
pub const WIN32K: Guid = Guid::from_fields(
    0x8c416c79,
    0xd49b,
    0x4f01,
    [0xa4, 0x67, 0xe5, 0x6d, 0x3a, 0xa8, 0x23, 0x4c],
);

// Opcodes shared by the process/thread/image providers
pub const OP_START: u8 = 1;
pub const OP_END: u8 = 2;
pub const OP_DC_START: u8 = 3;
pub const OP_DC_END: u8 = 4;

pub const OP_CSWITCH: u8 = 36;
pub const OP_READY_THREAD: u8 = 50;
pub const OP_SET_NAME: u8 = 72;
pub const OP_STACK: u8 = 32;
pub const OP_SAMPLE_PROF: u8 = 46;
pub const OP_COLLECTION_START: u8 = 73;
pub const OP_IMAGE_LOAD: u8 = 10;
pub const OP_DEMAND_ZERO_FAULT: u8 = 11;
pub const OP_VIRTUAL_ALLOC: u8 = 98;
pub const OP_VIRTUAL_FREE: u8 = 99;
pub const OP_FOCUS_CHANGE: u8 = 1;

const HEADER_FIELDS: &[Field] = &[
    field("BufferSize", FieldKind::U32),
    field("Version", FieldKind::U32),
    field("ProviderVersion", FieldKind::U32),
    field("NumberOfProcessors", FieldKind::U32),
    field("EndTime", FieldKind::U64),
    field("TimerResolution", FieldKind::U32),
    field("MaxFileSize", FieldKind::U32),
    field("LogFileMode", FieldKind::U32),
    field("BuffersWritten", FieldKind::U32),
    field("EventsLost", FieldKind::U32),
    field("CPUSpeed", FieldKind::U32),
    field("PerfFreq", FieldKind::U64),
    field("BootTime", FieldKind::U64),
    field("StartTime", FieldKind::U64),
    field("PointerSize", FieldKind::U32),
    field("ReservedFlags", FieldKind::U32),
];

const PROCESS_FIELDS: &[Field] = &[
    field("UniqueProcessKey", FieldKind::Pointer),
    field("ProcessId", FieldKind::U32),
    field("ParentId", FieldKind::U32),
    field("SessionId", FieldKind::U32),
    field("ExitStatus", FieldKind::I32),
    field("ImageFileName", FieldKind::AnsiString),
];

const THREAD_START_FIELDS: &[Field] = &[
    field("ProcessId", FieldKind::U32),
    field("TThreadId", FieldKind::U32),
    field("Win32StartAddr", FieldKind::Pointer),
    field("ThreadName", FieldKind::WideString),
];

const THREAD_END_FIELDS: &[Field] = &[
    field("ProcessId", FieldKind::U32),
    field("TThreadId", FieldKind::U32),
];

const CSWITCH_FIELDS: &[Field] = &[
    field("NewThreadId", FieldKind::U32),
    field("OldThreadId", FieldKind::U32),
    field("NewThreadPriority", FieldKind::I8),
    field("OldThreadPriority", FieldKind::I8),
    field("PreviousCState", FieldKind::U8),
    field("SpareByte", FieldKind::I8),
    field("OldThreadWaitReason", FieldKind::I8),
    field("OldThreadWaitMode", FieldKind::I8),
    field("OldThreadState", FieldKind::I8),
    field("OldThreadWaitIdealProcessor", FieldKind::I8),
    field("NewThreadWaitTime", FieldKind::U32),
    field("Reserved", FieldKind::U32),
];

const READY_THREAD_FIELDS: &[Field] = &[
    field("TThreadId", FieldKind::U32),
    field("AdjustReason", FieldKind::I8),
    field("AdjustIncrement", FieldKind::I8),
    field("Flag", FieldKind::I8),
    field("Reserved", FieldKind::I8),
];

const SET_NAME_FIELDS: &[Field] = &[
    field("ProcessId", FieldKind::U32),
    field("ThreadId", FieldKind::U32),
    field("ThreadName", FieldKind::WideString),
];

const STACK_WALK_FIELDS: &[Field] = &[
    field("EventTimeStamp", FieldKind::U64),
    field("StackProcess", FieldKind::U32),
    field("StackThread", FieldKind::U32),
    field("Stack", FieldKind::PointerArray),
];

const SAMPLE_PROF_FIELDS: &[Field] = &[
    field("InstructionPointer", FieldKind::Pointer),
    field("ThreadId", FieldKind::U32),
    field("Count", FieldKind::U32),
];

const COLLECTION_START_FIELDS: &[Field] = &[
    field("Source", FieldKind::U32),
    field("NewInterval", FieldKind::U32),
    field("OldInterval", FieldKind::U32),
];

const IMAGE_FIELDS: &[Field] = &[
    field("ImageBase", FieldKind::Pointer),
    field("ImageSize", FieldKind::Pointer),
    field("ProcessId", FieldKind::U32),
    field("FileName", FieldKind::WideString),
];

const DEMAND_ZERO_FAULT_FIELDS: &[Field] = &[
    field("VirtualAddress", FieldKind::Pointer),
    field("ProgramCounter", FieldKind::Pointer),
];

const VIRTUAL_MEM_FIELDS: &[Field] = &[
    field("BaseAddress", FieldKind::Pointer),
    field("RegionSize", FieldKind::Pointer),
    field("ProcessId", FieldKind::U32),
    field("Flags", FieldKind::U32),
];

const FOCUS_CHANGE_FIELDS: &[Field] = &[
    field("OldProcessId", FieldKind::U32),
    field("NewProcessId", FieldKind::U32),
];

macro_rules! schema {
    ($provider:expr, $opcode:expr, $task:literal, $op:literal, $xperf:literal, $fields:expr) => {
        EventSchema {
            provider: $provider,
            opcode: $opcode,
            task: $task,
            op_name: $op,
            xperf_label: $xperf,
            fields: $fields,
        }
    };
}

/// The complete built-in table. Loaded into the catalog map once; never
/// mutated afterwards.
pub const SCHEMAS: &[EventSchema] = &[
    schema!(EVENT_TRACE, 0, "MSNT_SystemTrace/EventTrace", "Header", "EventTrace-Header", HEADER_FIELDS),
    schema!(PROCESS, OP_START, "MSNT_SystemTrace/Process", "Start", "P-Start", PROCESS_FIELDS),
    schema!(PROCESS, OP_END, "MSNT_SystemTrace/Process", "End", "P-End", PROCESS_FIELDS),
    schema!(PROCESS, OP_DC_START, "MSNT_SystemTrace/Process", "DCStart", "P-DCStart", PROCESS_FIELDS),
    schema!(PROCESS, OP_DC_END, "MSNT_SystemTrace/Process", "DCEnd", "P-DCEnd", PROCESS_FIELDS),
    schema!(THREAD, OP_START, "MSNT_SystemTrace/Thread", "Start", "T-Start", THREAD_START_FIELDS),
    schema!(THREAD, OP_END, "MSNT_SystemTrace/Thread", "End", "T-End", THREAD_END_FIELDS),
    schema!(THREAD, OP_DC_START, "MSNT_SystemTrace/Thread", "DCStart", "T-DCStart", THREAD_START_FIELDS),
    schema!(THREAD, OP_DC_END, "MSNT_SystemTrace/Thread", "DCEnd", "T-DCEnd", THREAD_END_FIELDS),
    schema!(THREAD, OP_CSWITCH, "MSNT_SystemTrace/Thread", "CSwitch", "CSwitch", CSWITCH_FIELDS),
    schema!(THREAD, OP_READY_THREAD, "MSNT_SystemTrace/Thread", "ReadyThread", "ReadyThread", READY_THREAD_FIELDS),
    schema!(THREAD, OP_SET_NAME, "MSNT_SystemTrace/Thread", "SetName", "ThreadSetName", SET_NAME_FIELDS),
    schema!(STACK_WALK, OP_STACK, "MSNT_SystemTrace/StackWalk", "Stack", "Stack", STACK_WALK_FIELDS),
    schema!(PERF_INFO, OP_SAMPLE_PROF, "MSNT_SystemTrace/PerfInfo", "SampleProf", "SampledProfile", SAMPLE_PROF_FIELDS),
    schema!(PERF_INFO, OP_COLLECTION_START, "MSNT_SystemTrace/PerfInfo", "CollectionStart", "CollectionStart", COLLECTION_START_FIELDS),
    schema!(IMAGE, OP_IMAGE_LOAD, "MSNT_SystemTrace/Image", "Load", "I-Load", IMAGE_FIELDS),
    schema!(IMAGE, OP_END, "MSNT_SystemTrace/Image", "Unload", "I-Unload", IMAGE_FIELDS),
    schema!(IMAGE, OP_DC_START, "MSNT_SystemTrace/Image", "DCStart", "I-DCStart", IMAGE_FIELDS),
    schema!(IMAGE, OP_DC_END, "MSNT_SystemTrace/Image", "DCEnd", "I-DCEnd", IMAGE_FIELDS),
    schema!(PAGE_FAULT, OP_DEMAND_ZERO_FAULT, "MSNT_SystemTrace/PageFault", "DemandZeroFault", "DemandZeroFault", DEMAND_ZERO_FAULT_FIELDS),
    schema!(PAGE_FAULT, OP_VIRTUAL_ALLOC, "MSNT_SystemTrace/PageFault", "VirtualAlloc", "VirtualAlloc", VIRTUAL_MEM_FIELDS),
    schema!(PAGE_FAULT, OP_VIRTUAL_FREE, "MSNT_SystemTrace/PageFault", "VirtualFree", "VirtualFree", VIRTUAL_MEM_FIELDS),
    schema!(WIN32K, OP_FOCUS_CHANGE, "Microsoft-Windows-Win32k/Focus", "FocusedProcessChange", "FocusChange", FOCUS_CHANGE_FIELDS),
];
