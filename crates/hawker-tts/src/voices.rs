//! Logical voice tag → provider voice-id resolution.

use hawker_core::domain::voice;

/// Provider id used when a tag is unknown (sunny_boy's voice).
pub const FALLBACK_VOICE_ID: &str = "zh_male_M392_conversation_wvae_bigtts";

/// Resolve a logical tag to the provider's concrete voice id.
/// Unknown tags fall back to [`FALLBACK_VOICE_ID`].
pub fn provider_voice_id(tag: &str) -> &'static str {
    match tag {
        voice::SUNNY_BOY => "zh_male_M392_conversation_wvae_bigtts",
        voice::SOFT_GIRL => "zh_female_vv_uranus_bigtts",
        voice::PROMO_BOSS => "zh_male_yuanboxiaoshu_moon_bigtts",
        voice::SWEET_GIRL => "zh_female_xiaohe_uranus_bigtts",
        _ => FALLBACK_VOICE_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_resolves_to_a_distinct_provider_id() {
        let ids: Vec<_> = voice::ALL.iter().map(|t| provider_voice_id(t)).collect();
        for (i, id) in ids.iter().enumerate() {
            for other in &ids[i + 1..] {
                assert_ne!(id, other);
            }
        }
    }

    #[test]
    fn unknown_tags_fall_back_to_sunny_boy() {
        assert_eq!(provider_voice_id("robot_dj"), FALLBACK_VOICE_ID);
        assert_eq!(provider_voice_id(""), FALLBACK_VOICE_ID);
        assert_eq!(provider_voice_id(voice::SUNNY_BOY), FALLBACK_VOICE_ID);
    }
}
