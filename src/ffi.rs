//! FFI bindings for Synheart Affect
//!
//! C-compatible functions over the engine and the preset resolver. Inputs and
//! outputs are null-terminated JSON strings. Returned strings are allocated and
//! must be freed by the caller with `affect_free_string`.
//!
//! The engine is single-threaded: a handle must only be used from the thread
//! that created it.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::engine::AffectEngine;
use crate::error::AffectError;
use crate::journey::AnimationCommand;
use crate::preset::PresetResolver;
use crate::signals::{BoundedWindow, EventBus, InteractionEvent};
use crate::types::JourneyPhase;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Convert a C string to an owned Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Convert a Rust string to a C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn json_result<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&AffectError::from(e).to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Engine API
// ============================================================================

/// Animation commands held for the host between drains
const MAX_PENDING_COMMANDS: usize = 512;

/// Commands waiting for `affect_engine_take_commands`. The oldest are dropped
/// when the host does not drain.
struct CommandQueue {
    commands: BoundedWindow<AnimationCommand>,
    dropped: u64,
}

impl CommandQueue {
    fn new() -> Self {
        Self {
            commands: BoundedWindow::new(MAX_PENDING_COMMANDS),
            dropped: 0,
        }
    }

    fn push(&mut self, command: AnimationCommand) {
        if self.commands.push(command).is_some() {
            self.dropped += 1;
            if self.dropped == 1 {
                log::warn!(
                    "animation command queue full ({MAX_PENDING_COMMANDS}); dropping oldest until drained"
                );
            }
        }
    }

    fn take(&mut self) -> Vec<AnimationCommand> {
        if self.dropped > 0 {
            log::warn!("{} animation commands dropped since last drain", self.dropped);
            self.dropped = 0;
        }
        self.commands.drain()
    }
}

/// Opaque handle to an engine and the event bus it listens on
pub struct AffectEngineHandle {
    engine: AffectEngine,
    bus: EventBus,
    commands: Rc<RefCell<CommandQueue>>,
}

/// Create an engine from a JSON configuration.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for defaults.
/// - Must be freed with `affect_engine_free`.
/// - Returns NULL on error; call `affect_last_error` to get the error message.
/// - Animation commands queue up until `affect_engine_take_commands` is called.
///   At most 512 are held; older commands are dropped first.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_new(config_json: *const c_char) -> *mut AffectEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let mut engine = match AffectEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let commands = Rc::new(RefCell::new(CommandQueue::new()));
    let sink = Rc::clone(&commands);
    engine.on_animation(move |command| sink.borrow_mut().push(*command));

    Box::into_raw(Box::new(AffectEngineHandle {
        engine,
        bus: EventBus::new(),
        commands,
    }))
}

/// Free an engine. Detaches it first.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_free(handle: *mut AffectEngineHandle) {
    if !handle.is_null() {
        let mut handle = Box::from_raw(handle);
        handle.engine.detach();
        drop(handle);
    }
}

/// Attach the engine to its event bus and start the timers.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns 1 if attached, 0 if it was already attached, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_attach(handle: *mut AffectEngineHandle) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *handle;
    let source = Rc::new(handle.bus.clone());
    i32::from(handle.engine.attach(source))
}

/// Detach the engine. Safe to call repeatedly.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns 1 if detached, 0 if it was not attached, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_detach(handle: *mut AffectEngineHandle) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *handle;
    i32::from(handle.engine.detach())
}

/// Dispatch one interaction event given as JSON.
///
/// Scroll `progress` reaches the journey animator on the next
/// `affect_engine_advance`.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - `event_json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_dispatch(
    handle: *mut AffectEngineHandle,
    event_json: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *handle;

    let json = match cstr_to_string(event_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid event string pointer");
            return -1;
        }
    };

    let event = match InteractionEvent::from_json(&json) {
        Ok(event) => event,
        Err(e) => {
            set_last_error(&e.to_string());
            return -1;
        }
    };

    if !handle.engine.is_attached() {
        set_last_error(&AffectError::NotAttached.to_string());
        return -1;
    }

    handle.bus.dispatch(&event);
    0
}

/// Run due timer ticks. Returns a JSON array of tick reports.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns a newly allocated string that must be freed with `affect_free_string`.
/// - Returns NULL on error; call `affect_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_advance(handle: *mut AffectEngineHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *handle;
    let reports = handle.engine.advance();
    json_result(&reports)
}

/// Force an analysis tick now. Returns the tick report as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns a newly allocated string that must be freed with `affect_free_string`.
/// - Returns NULL on error; call `affect_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_analyze(handle: *mut AffectEngineHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *handle;
    let report = handle.engine.run_analysis_tick();
    json_result(&report)
}

/// Move to a journey phase by name (discovery, consideration, decision, booking).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - `phase` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_set_phase(
    handle: *mut AffectEngineHandle,
    phase: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *handle;

    let name = match cstr_to_string(phase) {
        Some(s) => s,
        None => {
            set_last_error("Invalid phase string pointer");
            return -1;
        }
    };

    match name.parse::<JourneyPhase>() {
        Ok(phase) => {
            handle.engine.set_phase(phase);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Report page scroll progress (0-100).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_scroll(handle: *mut AffectEngineHandle, progress: f64) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *handle;
    handle.engine.update_scroll_progress(progress);
    0
}

/// Drain animation commands emitted since the last call, as a JSON array.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns a newly allocated string that must be freed with `affect_free_string`.
/// - Returns NULL on error; call `affect_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_take_commands(
    handle: *mut AffectEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *handle;
    let commands = handle.commands.borrow_mut().take();
    json_result(&commands)
}

/// Current emotional state as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `affect_engine_new`.
/// - Returns a newly allocated string that must be freed with `affect_free_string`.
/// - Returns NULL on error; call `affect_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn affect_engine_snapshot(handle: *mut AffectEngineHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*handle;
    match handle.engine.snapshot_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Resolve an animation preset by names. Unknown names fall back to defaults.
///
/// # Safety
/// - `category`, `mood` and `intensity` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `affect_free_string`.
/// - Returns NULL on error; call `affect_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn affect_resolve_preset(
    category: *const c_char,
    mood: *const c_char,
    intensity: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let category = match cstr_to_string(category) {
        Some(s) => s,
        None => {
            set_last_error("Invalid category string pointer");
            return ptr::null_mut();
        }
    };
    let mood = match cstr_to_string(mood) {
        Some(s) => s,
        None => {
            set_last_error("Invalid mood string pointer");
            return ptr::null_mut();
        }
    };
    let intensity = match cstr_to_string(intensity) {
        Some(s) => s,
        None => {
            set_last_error("Invalid intensity string pointer");
            return ptr::null_mut();
        }
    };

    let preset = PresetResolver::resolve_by_name(&category, &mood, &intensity);
    json_result(&preset)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Affect functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Affect function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn affect_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Affect function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn affect_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn affect_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
