use garden_core::{GardenError, Result, WaterReply, MAX_NOURISHMENT};
use serde::{Deserialize, Serialize};

/// Body of every Plant Service request.
#[derive(Debug, Clone, Serialize)]
pub struct PlantRequest<'a> {
    pub plant_name: &'a str,
}

/// JSON shape returned by `POST /water_plant`.
///
/// Everything but `success` is optional; the numeric fields only mean
/// something when `success` is `true`.
#[derive(Debug, Clone, Deserialize)]
pub struct WaterResponse {
    pub success: bool,
    #[serde(default)]
    pub new_nourishment_level: Option<i64>,
    #[serde(default)]
    pub new_user_experience: Option<i64>,
    #[serde(default)]
    pub gained_experience: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voted_on_topgg: bool,
    #[serde(default)]
    pub multipliers: Vec<Multiplier>,
}

/// One experience multiplier the server applied to a watering.
#[derive(Debug, Clone, Deserialize)]
pub struct Multiplier {
    pub multiplier: f64,
    pub text: String,
}

/// JSON shape returned by `POST /delete_plant` and `POST /revive_plant`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
}

impl WaterResponse {
    /// Summary of the experience bonus fields, if the server sent any.
    pub fn bonus_summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(gained) = self.gained_experience {
            parts.push(format!("+{gained} exp"));
        }
        if self.voted_on_topgg {
            parts.push("voted".to_string());
        }
        for m in &self.multipliers {
            parts.push(format!("x{} {}", m.multiplier, m.text));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }

    /// Convert into the core [`WaterReply`], checking the numeric fields.
    pub fn into_reply(self) -> Result<WaterReply> {
        if !self.success {
            return Ok(WaterReply::Rejected { reason: self.text });
        }

        let level = self.new_nourishment_level.ok_or_else(|| {
            GardenError::Protocol("successful watering without new_nourishment_level".into())
        })?;
        if level < 0 {
            return Err(GardenError::Protocol(format!(
                "negative nourishment level {level}"
            )));
        }
        // Levels past the cap still read as a full bar.
        let nourishment = level.min(i64::from(MAX_NOURISHMENT)) as u8;

        let experience = match self.new_user_experience {
            Some(xp) => Some(u64::try_from(xp).map_err(|_| {
                GardenError::Protocol(format!("negative user experience {xp}"))
            })?),
            None => None,
        };

        let bonus = self.bonus_summary();
        Ok(WaterReply::Accepted {
            nourishment,
            experience,
            text: self.text,
            bonus,
        })
    }
}

/// Decode a `/water_plant` response.
///
/// The server answers refusals with HTTP 400 and a `success: false` body, so
/// the body is tried first whatever the status; only an unparseable body on
/// a non-2xx status counts as an HTTP failure.
pub fn decode_water(status: u16, body: &str) -> Result<WaterReply> {
    match serde_json::from_str::<WaterResponse>(body) {
        Ok(response) => response.into_reply(),
        Err(e) if is_success(status) => {
            Err(GardenError::Protocol(format!("parse water response: {e}")))
        }
        Err(_) => Err(GardenError::Http(format!("status {status}"))),
    }
}

/// Decode a `/delete_plant` or `/revive_plant` response.
pub fn decode_action(status: u16, body: &str) -> Result<bool> {
    match serde_json::from_str::<ActionResponse>(body) {
        Ok(response) => Ok(response.success),
        Err(e) if is_success(status) => {
            Err(GardenError::Protocol(format!("parse action response: {e}")))
        }
        Err(_) => Err(GardenError::Http(format!("status {status}"))),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_plant_name_key() {
        let body = serde_json::to_string(&PlantRequest { plant_name: "rose" }).unwrap();
        assert_eq!(body, r#"{"plant_name":"rose"}"#);
    }

    #[test]
    fn decode_successful_watering() {
        let body = r#"{
            "success": true,
            "text": "You gained 12 exp!",
            "gained_experience": 12,
            "new_nourishment_level": 14,
            "new_user_experience": 530,
            "voted_on_topgg": false,
            "multipliers": [{"multiplier": 1.5, "text": "You voted!"}]
        }"#;
        let reply = decode_water(200, body).unwrap();
        assert_eq!(
            reply,
            WaterReply::Accepted {
                nourishment: 14,
                experience: Some(530),
                text: Some("You gained 12 exp!".into()),
                bonus: Some("+12 exp, x1.5 You voted!".into()),
            }
        );
    }

    #[test]
    fn refusal_with_400_is_a_rejection() {
        let body = r#"{"success": false, "text": "Too soon!", "new_nourishment_level": 0}"#;
        let reply = decode_water(400, body).unwrap();
        assert_eq!(
            reply,
            WaterReply::Rejected {
                reason: Some("Too soon!".into())
            }
        );
    }

    #[test]
    fn unauthorized_without_body_is_http_error() {
        assert!(matches!(decode_water(401, ""), Err(GardenError::Http(_))));
        assert!(matches!(decode_action(401, ""), Err(GardenError::Http(_))));
    }

    #[test]
    fn success_without_level_is_protocol_error() {
        let reply = decode_water(200, r#"{"success": true}"#);
        assert!(matches!(reply, Err(GardenError::Protocol(_))));
    }

    #[test]
    fn level_above_cap_is_clamped() {
        let reply = decode_water(200, r#"{"success": true, "new_nourishment_level": 40}"#);
        assert!(matches!(
            reply,
            Ok(WaterReply::Accepted { nourishment: 21, experience: None, .. })
        ));
    }

    #[test]
    fn bonus_lists_vote_and_multipliers() {
        let body = r#"{
            "success": true,
            "new_nourishment_level": 3,
            "gained_experience": 20,
            "voted_on_topgg": true,
            "multipliers": [{"multiplier": 2.0, "text": "Weekend"}]
        }"#;
        let response: WaterResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.bonus_summary().as_deref(),
            Some("+20 exp, voted, x2 Weekend")
        );

        let plain: WaterResponse =
            serde_json::from_str(r#"{"success": true, "new_nourishment_level": 3}"#).unwrap();
        assert_eq!(plain.bonus_summary(), None);
    }

    #[test]
    fn decode_action_flags() {
        assert!(decode_action(200, r#"{"success": true}"#).unwrap());
        assert!(!decode_action(400, r#"{"success": false}"#).unwrap());
        assert!(decode_action(200, "not json").is_err());
    }
}
