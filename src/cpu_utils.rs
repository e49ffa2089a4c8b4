use crate::logger;

/// Checks that `core_id` names one of the host's logical cores.
pub fn validate_core(core_id: usize) -> Result<usize, String> {
    let total_cores = num_cpus::get();
    if core_id >= total_cores {
        return Err(format!(
            "core {} does not exist, this host has {} logical cores (0..={})",
            core_id,
            total_cores,
            total_cores - 1
        ));
    }
    Ok(core_id)
}

/// Binds the current thread to a specific logical core.
///
/// Keeping the verification loop on one core keeps repeated reads of the
/// same address evenly spaced, which matters for the address-line tests.
///
/// # Returns
/// `true` on success, `false` on failure.
pub fn bind_thread_to_core(core_id: usize) -> bool {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(core) = core_ids.into_iter().find(|c| c.id == core_id) {
            return core_affinity::set_for_current(core);
        }
    }
    false
}

/// Validates and applies an optional `--core` request. Pinning failures are
/// only worth a warning, an out-of-range core is a configuration error.
pub fn apply_core_request(requested: Option<usize>) -> Result<(), String> {
    let Some(core_id) = requested else {
        return Ok(());
    };
    let core_id = validate_core(core_id)?;
    if bind_thread_to_core(core_id) {
        logger::log_info(&format!("Verification thread bound to core {}", core_id));
    } else {
        logger::log_warn(&format!("Failed to bind verification thread to core {}", core_id));
    }
    Ok(())
}
