//! Centralized Configuration Management
//!
//! Consolidates the configuration structures used by the controller,
//! dispatcher and sink into one [`BridgeConfig`].

use core::time::Duration;

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes for the bridge's bounded channels
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChannelConfig {
    /// Buffer size for the outbound channel (dispatcher → publisher task)
    pub outbound_buffer_size: usize,
    /// Buffer size for the inbound channel (subscriber task → sink)
    pub inbound_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: 64,  // UI sends are infrequent
            inbound_buffer_size: 128,  // bus traffic can be bursty
        }
    }
}

impl ChannelConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            outbound_buffer_size: 16,
            inbound_buffer_size: 16,
        }
    }

    /// Create configuration for high-throughput embedders
    pub fn high_throughput() -> Self {
        Self {
            outbound_buffer_size: 256,
            inbound_buffer_size: 512,
        }
    }
}

// ----------------------------------------------------------------------------
// Controller Configuration
// ----------------------------------------------------------------------------

/// Timing knobs for endpoint lifecycle control
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ControllerConfig {
    /// How long a spawned task may take to confirm readiness before the
    /// start is treated as failed
    pub confirm_timeout: Duration,
    /// Maximum payload size accepted at the boundary, in bytes
    pub max_payload_bytes: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_secs(5),
            max_payload_bytes: 64 * 1024,
        }
    }
}

impl ControllerConfig {
    /// Create configuration optimized for testing (short timeouts)
    pub fn testing() -> Self {
        Self {
            confirm_timeout: Duration::from_millis(250),
            max_payload_bytes: 1024,
        }
    }
}

// ----------------------------------------------------------------------------
// Bridge Configuration
// ----------------------------------------------------------------------------

/// Top-level configuration for the bridge
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BridgeConfig {
    pub channels: ChannelConfig,
    pub controller: ControllerConfig,
}

impl BridgeConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            channels: ChannelConfig::testing(),
            controller: ControllerConfig::testing(),
        }
    }

    /// Validate the configuration, returning a reason string on failure
    pub fn validate(&self) -> core::result::Result<(), String> {
        if self.channels.outbound_buffer_size == 0 {
            return Err("outbound_buffer_size must be greater than zero".to_string());
        }
        if self.channels.inbound_buffer_size == 0 {
            return Err("inbound_buffer_size must be greater than zero".to_string());
        }
        if self.controller.confirm_timeout.is_zero() {
            return Err("confirm_timeout must be greater than zero".to_string());
        }
        if self.controller.max_payload_bytes == 0 {
            return Err("max_payload_bytes must be greater than zero".to_string());
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
