//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `pin_bank` | OutputPort         | relay GPIOs (embedded-hal)|
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod pin_bank;
pub mod wifi;
