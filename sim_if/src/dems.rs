//! # Actuation Demands Module
//!
//! Demands are sent to the simulation server once per control cycle and
//! acknowledged with a [`DemsResponse`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::telem::CamFrame;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from the rover software to the simulation server.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct RoverDems {
    /// Demanded throttle, signed. Negative values drive in reverse.
    pub throttle: f64,

    /// Demanded brake, non-negative.
    pub brake: f64,

    /// Demanded steering angle in degrees, positive to the left.
    pub steer_deg: f64,

    /// When true the server shall run the sample pickup mechanism.
    pub send_pickup: bool,
}

/// Message sent to the simulation server each cycle.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DemsMsg {
    /// Actuation demands for this cycle
    pub dems: RoverDems,

    /// Terrain classification overlay for the server's display, if perception
    /// produced one this cycle.
    pub vision_frame: Option<CamFrame>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response from the simulation server to a demands message.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum DemsResponse {
    /// Demands were valid and will be actuated
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dems_msg_wire_shape() {
        let msg = DemsMsg {
            dems: RoverDems {
                throttle: 0.2,
                brake: 0.0,
                steer_deg: -7.5,
                send_pickup: false,
            },
            vision_frame: None,
        };

        let value = serde_json::to_value(&msg).expect("Failed to serialize");

        assert_eq!(value["dems"]["throttle"], 0.2);
        assert_eq!(value["dems"]["steer_deg"], -7.5);
        assert!(value["vision_frame"].is_null());

        // The server replies with a bare enum variant name
        let response: DemsResponse =
            serde_json::from_str("\"DemsOk\"").expect("Failed to deserialize");
        assert_eq!(response, DemsResponse::DemsOk);
    }
}
