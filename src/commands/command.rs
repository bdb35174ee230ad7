use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by every subcommand.
#[enum_dispatch]
pub trait Command {
    fn execute(&self) -> Result<()>;
}
