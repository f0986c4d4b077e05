//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements   | Connects to                   |
//! |------------------|--------------|-------------------------------|
//! | `config_file`    | ConfigPort   | JSON document on disk         |
//! | `log_sink`       | EventSink    | `log` facade / console        |
//! | `pwm_ioctl`      | DevicePort   | PWM output node via `ioctl`   |
//! | `sim_pwm`        | DevicePort   | In-memory output block (host) |
//! | `thread_spawner` | TaskSpawner  | Named OS threads              |

pub mod config_file;
pub mod log_sink;
#[cfg(feature = "nuttx")]
pub mod pwm_ioctl;
pub mod sim_pwm;
pub mod thread_spawner;
