use crate::stream::channels::ChannelVector;

pub const G_M_S2: f64 = 9.81;

/// Signed shortest rotation from `hdg1` to `hdg2`, in degrees.
/// Positive is clockwise. Result lies in [-180, 180].
pub fn shortest_heading_path(hdg1: f64, hdg2: f64) -> f64 {
    let hdg1 = hdg1.rem_euclid(360.0);
    let hdg2 = hdg2.rem_euclid(360.0);

    let diff = hdg2 - hdg1;

    if diff > 180.0 {
        diff - 360.0
    } else if diff < -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

/// Coordinated-turn bank angle for a heading change spread over one sample
/// period.
pub fn bank_angle(ground_speed: f64, heading_change_deg: f64) -> f64 {
    let turn_rate = heading_change_deg.to_radians();

    if turn_rate == 0.0 || ground_speed == 0.0 {
        return 0.0;
    }

    let turn_radius = ground_speed / turn_rate;

    (ground_speed.powi(2) / (G_M_S2 * turn_radius))
        .atan()
        .to_degrees()
}

/// Flight path angle for an altitude change over one sample period.
pub fn pitch_angle(alt1: f64, alt2: f64, ground_speed: f64) -> f64 {
    let altitude_change = alt2 - alt1;

    if ground_speed == 0.0 || altitude_change == 0.0 {
        return 0.0;
    }

    (altitude_change / ground_speed).atan().to_degrees()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedAngles {
    pub bank: f64,
    pub pitch: f64,
}

impl DerivedAngles {
    /// Angles for `curr` given the previous sample. A channel whose input did
    /// not change keeps the previous angle instead of being recomputed.
    pub fn derive(prev: &ChannelVector, prev_angles: DerivedAngles, curr: &ChannelVector) -> Self {
        let bank = if curr.heading() != prev.heading() {
            let diff = shortest_heading_path(prev.heading(), curr.heading());
            bank_angle(curr.ground_speed(), diff)
        } else {
            prev_angles.bank
        };

        let pitch = if curr.altitude() != prev.altitude() {
            pitch_angle(prev.altitude(), curr.altitude(), curr.ground_speed())
        } else {
            prev_angles.pitch
        };

        DerivedAngles { bank, pitch }
    }
}
