pub mod i2c;

#[cfg(test)]
pub mod i2c_test;

/// A command sent to a source device over its channel.
#[derive(Debug, Clone)]
pub enum SourceCommand {
    Stop,
}
