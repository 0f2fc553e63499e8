// Drops an elevated effective identity back to the real one before any bus
// traffic, so the manager never sees a privileged caller and never prompts.

use nix::unistd::{self, Uid};

use super::error::Error;

/// The process identity the privilege check works against.
pub trait Identity {
    fn real(&self) -> Uid;
    fn effective(&self) -> Uid;
    fn set_uid(&self, uid: Uid) -> nix::Result<()>;
}

/// Identity of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessIdentity;

impl Identity for ProcessIdentity {
    fn real(&self) -> Uid {
        unistd::getuid()
    }

    fn effective(&self) -> Uid {
        unistd::geteuid()
    }

    fn set_uid(&self, uid: Uid) -> nix::Result<()> {
        unistd::setuid(uid)
    }
}

/// Makes the effective uid equal to the real uid. A no-op when they already
/// match.
pub fn drop_to_real_identity(identity: &impl Identity) -> Result<(), Error> {
    let real = identity.real();
    let effective = identity.effective();
    if real == effective {
        return Ok(());
    }

    log::debug!("dropping effective uid {effective} to real uid {real}");
    let failed = |reason: String| Error::PrivilegeDropFailed {
        real: real.as_raw(),
        effective: effective.as_raw(),
        reason,
    };

    identity.set_uid(real).map_err(|errno| failed(errno.desc().to_string()))?;

    let now = identity.effective();
    if now != real {
        return Err(failed(format!("effective uid is still {now}")));
    }
    Ok(())
}
