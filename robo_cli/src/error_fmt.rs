//! Human-readable error descriptions, exit codes and structured JSON errors.

use robo_core::error::{BuildError, ControlError};

/// Context attached when reading the config file fails.
pub const CONFIG_READ: &str = "reading config";
/// Context attached when the config file is not valid TOML for the schema.
pub const CONFIG_PARSE: &str = "parsing config";
/// Context attached when `Config::validate` rejects the config.
pub const CONFIG_INVALID: &str = "invalid configuration";

fn has_context(err: &eyre::Report, ctx: &str) -> bool {
    err.chain().any(|e| e.to_string().starts_with(ctx))
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDrive | BuildError::MissingArm | BuildError::MissingShooter => {
                format!(
                    "What happened: The robot could not be assembled ({be}).\nLikely causes: A device failed to initialize or was not wired into the builder.\nHow to fix: Check device setup, then rerun `robocore self-check`."
                )
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/robot.toml for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        let at = err.to_string();
        return match ce {
            ControlError::HardwareFault(msg) => format!(
                "What happened: A device stopped responding during {at} ({msg}).\nLikely causes: Loose wiring, lost power or a bus timeout.\nHow to fix: Check the device and its connection; all actuators were stopped."
            ),
            ControlError::Hardware(msg) => format!(
                "What happened: A device rejected a command during {at} ({msg}).\nLikely causes: Driver fault or a device in an error state.\nHow to fix: Inspect the device, then rerun with --log-level=debug for detail; all actuators were stopped."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if has_context(err, CONFIG_READ) {
        let cause = err.root_cause();
        return format!(
            "What happened: The config file could not be read ({cause}).\nLikely causes: Wrong path or missing permissions.\nHow to fix: Pass --config <FILE> or create etc/robot.toml."
        );
    }
    if has_context(err, CONFIG_PARSE) {
        let cause = err.root_cause();
        return format!(
            "What happened: The config file is not valid TOML for this schema.\nDetails: {cause}\nHow to fix: Fix the reported line; unknown sections are ignored, wrong types are not."
        );
    }
    if has_context(err, CONFIG_INVALID) {
        let cause = err.root_cause();
        return format!(
            "What happened: Invalid configuration ({cause}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/robot.toml for a sample."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 hardware, 4 configuration or build, 1 anything else.
///
/// Usage errors exit with 2 from clap before any of this runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<ControlError>()
        && matches!(ce, ControlError::Hardware(_) | ControlError::HardwareFault(_))
    {
        return 3;
    }
    if err.downcast_ref::<BuildError>().is_some()
        || has_context(err, CONFIG_READ)
        || has_context(err, CONFIG_PARSE)
        || has_context(err, CONFIG_INVALID)
    {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "MissingHardware",
        };
    }
    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Hardware(_) => "Hardware",
            ControlError::HardwareFault(_) => "HardwareFault",
            ControlError::InvalidCommand { .. } => "InvalidCommand",
            ControlError::Config(_) => "InvalidConfig",
            ControlError::State(_) => "State",
        };
    }
    if has_context(err, CONFIG_INVALID) || has_context(err, CONFIG_PARSE) {
        return "InvalidConfig";
    }
    if has_context(err, CONFIG_READ) {
        return "ConfigUnreadable";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
