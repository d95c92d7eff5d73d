//! Interface to the bytecode interpreter
//!
//! The text core re-enters running code in exactly two places: timed-input
//! callbacks and sound-finished notifications. Both call a routine with no
//! arguments, run it to completion on the caller's thread, and read its
//! result off the stack.

/// Bytecode execution operations the text core drives
pub trait Exec {
    /// Push a call frame for the routine at `addr` with the given arguments
    fn enter_routine(&mut self, addr: u16, args: &[u16]) -> Result<(), String>;

    /// Execute until the routine entered above returns
    fn run_to_return(&mut self) -> Result<(), String>;

    /// Pop the returned value off the evaluation stack
    fn pop_result(&mut self) -> Result<u16, String>;

    /// Mark the start of a blocking call out to the I/O host
    fn begin_external_wait(&mut self) {}

    /// Mark the end of a blocking call out to the I/O host
    fn end_external_wait(&mut self) {}
}

/// Call a routine with no arguments and hand back its return value.
/// This is the whole body of a timed-input callback.
pub fn call_routine(exec: &mut dyn Exec, routine: u16) -> Result<u16, String> {
    exec.enter_routine(routine, &[])?;
    exec.run_to_return()?;
    exec.pop_result()
}
