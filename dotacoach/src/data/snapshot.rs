use serde::{Deserialize, Serialize};

/// Buyback availability as reported by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuybackStatus {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "COOLDOWN")]
    Cooldown,
    #[serde(rename = "NO_GOLD")]
    NoGold,
}

impl BuybackStatus {
    /// Wire literal, exactly as the producer spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuybackStatus::Ready => "READY",
            BuybackStatus::Cooldown => "COOLDOWN",
            BuybackStatus::NoGold => "NO_GOLD",
        }
    }

    pub fn from_wire(s: &str) -> Option<BuybackStatus> {
        match s {
            "READY" => Some(BuybackStatus::Ready),
            "COOLDOWN" => Some(BuybackStatus::Cooldown),
            "NO_GOLD" => Some(BuybackStatus::NoGold),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully populated telemetry record, as received in a single frame.
///
/// Field names match the wire format. The producer pre-computes the clock
/// display, the objective text and the four item/regen alert flags; the
/// client never recomputes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub hero_name: String,
    /// Match clock, already formatted as "MM:SS".
    pub clock_display: String,
    pub strategy_text: String,
    pub strategy_warn: bool,
    /// 0..=100
    pub health_percent: u8,
    /// 0..=100
    pub mana_percent: u8,
    pub gold: u32,
    pub last_hits: u32,
    pub denies: u32,
    pub buyback_status: BuybackStatus,
    /// Gold still needed to buy back. Only meaningful with `NoGold`.
    pub buyback_missing: u32,
    pub gpm: i32,
    /// "K/D/A"
    pub kda: String,
    pub wand_alert: bool,
    pub tp_alert: bool,
    pub hp_regen_alert: bool,
    pub mana_regen_alert: bool,
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SNAPSHOT({}) {} hp:{}% mp:{}% gold:{} gpm:{} lh/dn:{}/{} kda:{} bb:{}",
            self.clock_display,
            self.hero_name,
            self.health_percent,
            self.mana_percent,
            self.gold,
            self.gpm,
            self.last_hits,
            self.denies,
            self.kda,
            self.buyback_status
        )?;
        if self.buyback_status == BuybackStatus::NoGold {
            write!(f, "(-{})", self.buyback_missing)?;
        }
        Ok(())
    }
}
