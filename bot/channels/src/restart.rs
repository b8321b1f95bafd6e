//! `/restart`: replace the running process with a fresh image.

use anyhow::Context;
use tracing::info;

/// Re-exec the current binary with the same arguments. On success this
/// never returns.
pub fn reexec() -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("could not locate the current executable")?;
    info!(exe = %exe.display(), "Re-executing");

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = std::process::Command::new(&exe)
            .args(std::env::args_os().skip(1))
            .exec();
        Err(anyhow::Error::new(err).context("re-exec failed"))
    }

    #[cfg(not(unix))]
    {
        // No exec on this platform; exit and let the supervisor bring the
        // process back up.
        std::process::exit(0)
    }
}
