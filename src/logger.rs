//! File logger for the shell
//!
//! The menu owns the terminal, so log output goes to a file next to the
//! database instead of stderr.

pub fn init(filepath: &str) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Warn)
        .level_for("bibman", log::LevelFilter::Debug)
        .chain(fern::log_file(filepath)?)
        .apply()?;

    Ok(())
}
