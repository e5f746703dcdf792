/// the fan-out side of the broadcaster.
///
/// the broadcaster owns a handler loop fed by a bounded command channel; each
/// invalidation command runs one orchestrator cycle: resolve, discover, run the
/// command on every ready cache node in parallel, wait for all of them, report.
///
pub mod broadcaster;
pub mod executor;
pub mod orchestrator;
pub mod report;
