/*!
 * Runtime Configuration
 *
 * Table capacity, stack size and preemption interval, with environment
 * overrides for the demo binary.
 */

use super::errors::KernelError;
use super::limits::*;
use super::types::KernelResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `max_processes`
pub const ENV_MAX_PROCESSES: &str = "GREEN_KERNEL_MAX_PROCESSES";
/// Environment variable overriding `stack_size` (bytes)
pub const ENV_STACK_SIZE: &str = "GREEN_KERNEL_STACK_SIZE";
/// Environment variable overriding `preempt_interval` (microseconds)
pub const ENV_PREEMPT_MICROS: &str = "GREEN_KERNEL_PREEMPT_MICROS";

/// Runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuntimeConfig {
    /// Fixed capacity of the process table (default: 10)
    pub max_processes: usize,

    /// Bytes of usable stack per process (default: 256KB)
    pub stack_size: usize,

    /// Time slice before a running process is preempted (default: 1ms)
    #[serde(with = "duration_micros")]
    pub preempt_interval: Duration,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            stack_size: DEFAULT_STACK_SIZE,
            preempt_interval: DEFAULT_PREEMPT_INTERVAL,
        }
    }

    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes;
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_preempt_interval(mut self, interval: Duration) -> Self {
        self.preempt_interval = interval;
        self
    }

    /// Defaults overridden by `GREEN_KERNEL_*` environment variables
    pub fn from_env() -> KernelResult<Self> {
        let mut config = Self::new();

        if let Some(value) = read_env(ENV_MAX_PROCESSES)? {
            config.max_processes = value as usize;
        }
        if let Some(value) = read_env(ENV_STACK_SIZE)? {
            config.stack_size = value as usize;
        }
        if let Some(value) = read_env(ENV_PREEMPT_MICROS)? {
            config.preempt_interval = Duration::from_micros(value);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every value against `core::limits`
    pub fn validate(&self) -> KernelResult<()> {
        if self.max_processes == 0 || self.max_processes > MAX_PROCESSES_LIMIT {
            return Err(KernelError::InvalidConfig(format!(
                "max_processes {} must be between 1 and {}",
                self.max_processes, MAX_PROCESSES_LIMIT
            )));
        }

        if self.stack_size < MIN_STACK_SIZE || self.stack_size > MAX_STACK_SIZE {
            return Err(KernelError::InvalidConfig(format!(
                "stack_size {} must be between {} and {} bytes",
                self.stack_size, MIN_STACK_SIZE, MAX_STACK_SIZE
            )));
        }

        if self.preempt_interval < MIN_PREEMPT_INTERVAL
            || self.preempt_interval > MAX_PREEMPT_INTERVAL
        {
            return Err(KernelError::InvalidConfig(format!(
                "preempt_interval {:?} must be between {:?} and {:?}",
                self.preempt_interval, MIN_PREEMPT_INTERVAL, MAX_PREEMPT_INTERVAL
            )));
        }

        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env(key: &str) -> KernelResult<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| KernelError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}

mod duration_micros {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_micros() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_micros)
    }
}
