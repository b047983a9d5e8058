use super::snapshot::Snapshot;

/// Health below this percentage is urgent.
pub const LOW_HEALTH_PERCENT: u8 = 30;
/// Mana below this percentage is urgent.
pub const LOW_MANA_PERCENT: u8 = 20;

/// Presentation alerts for one `Snapshot`.
///
/// The two vitals flags are derived from fixed thresholds; the remaining
/// four are the producer's own flags, passed through as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlertSet {
    pub low_health: bool,
    pub low_mana: bool,
    pub wand_ready: bool,
    pub teleport_missing: bool,
    pub hp_regen_needed: bool,
    pub mana_regen_needed: bool,
}

/// A single alert, in banner display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alert {
    LowHealth,
    LowMana,
    WandReady,
    TeleportMissing,
    HpRegenNeeded,
    ManaRegenNeeded,
}

impl Alert {
    pub const ALL: [Alert; 6] = [
        Alert::LowHealth,
        Alert::LowMana,
        Alert::WandReady,
        Alert::TeleportMissing,
        Alert::HpRegenNeeded,
        Alert::ManaRegenNeeded,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Alert::LowHealth => "LOW HEALTH",
            Alert::LowMana => "LOW MANA",
            Alert::WandReady => "USE YOUR WAND!",
            Alert::TeleportMissing => "NO TP SCROLL",
            Alert::HpRegenNeeded => "BUY HEALTH REGEN",
            Alert::ManaRegenNeeded => "BUY MANA REGEN",
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl AlertSet {
    pub fn is_set(&self, alert: Alert) -> bool {
        match alert {
            Alert::LowHealth => self.low_health,
            Alert::LowMana => self.low_mana,
            Alert::WandReady => self.wand_ready,
            Alert::TeleportMissing => self.teleport_missing,
            Alert::HpRegenNeeded => self.hp_regen_needed,
            Alert::ManaRegenNeeded => self.mana_regen_needed,
        }
    }

    /// Active alerts, in display order.
    pub fn active(&self) -> impl Iterator<Item = Alert> + '_ {
        Alert::ALL.into_iter().filter(|a| self.is_set(*a))
    }

    pub fn any(&self) -> bool {
        self.active().next().is_some()
    }
}

impl From<&Snapshot> for AlertSet {
    fn from(snapshot: &Snapshot) -> AlertSet {
        derive(snapshot)
    }
}

/// Computes the alerts for a snapshot. Total and side-effect free.
pub fn derive(snapshot: &Snapshot) -> AlertSet {
    AlertSet {
        low_health: snapshot.health_percent < LOW_HEALTH_PERCENT,
        low_mana: snapshot.mana_percent < LOW_MANA_PERCENT,
        wand_ready: snapshot.wand_alert,
        teleport_missing: snapshot.tp_alert,
        hp_regen_needed: snapshot.hp_regen_alert,
        mana_regen_needed: snapshot.mana_regen_alert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BuybackStatus;

    fn snapshot(health: u8, mana: u8) -> Snapshot {
        Snapshot {
            hero_name: "npc_dota_hero_storm_spirit".to_string(),
            clock_display: "07:10".to_string(),
            strategy_text: "Wisdom rune at 7:00".to_string(),
            strategy_warn: true,
            health_percent: health,
            mana_percent: mana,
            gold: 640,
            last_hits: 41,
            denies: 6,
            buyback_status: BuybackStatus::Ready,
            buyback_missing: 0,
            gpm: 430,
            kda: "1/0/2".to_string(),
            wand_alert: false,
            tp_alert: false,
            hp_regen_alert: false,
            mana_regen_alert: false,
        }
    }

    #[test]
    fn test_low_health_boundary() {
        assert!(derive(&snapshot(29, 80)).low_health);
        assert!(!derive(&snapshot(30, 80)).low_health);
        assert!(derive(&snapshot(0, 80)).low_health);
        assert!(!derive(&snapshot(100, 80)).low_health);
    }

    #[test]
    fn test_low_mana_boundary() {
        assert!(derive(&snapshot(80, 19)).low_mana);
        assert!(!derive(&snapshot(80, 20)).low_mana);
        assert!(derive(&snapshot(80, 0)).low_mana);
    }

    #[test]
    fn test_thresholds_match_percent_for_all_values() {
        for p in 0..=100u8 {
            let alerts = derive(&snapshot(p, p));
            assert_eq!(alerts.low_health, p < 30, "health {}", p);
            assert_eq!(alerts.low_mana, p < 20, "mana {}", p);
        }
    }

    #[test]
    fn test_producer_flags_pass_through() {
        let mut s = snapshot(90, 90);
        s.wand_alert = true;
        s.mana_regen_alert = true;
        let alerts = derive(&s);
        assert_eq!(
            alerts,
            AlertSet {
                wand_ready: true,
                mana_regen_needed: true,
                ..Default::default()
            }
        );

        s.wand_alert = false;
        s.tp_alert = true;
        s.hp_regen_alert = true;
        s.mana_regen_alert = false;
        let alerts = derive(&s);
        assert!(!alerts.wand_ready);
        assert!(alerts.teleport_missing);
        assert!(alerts.hp_regen_needed);
        assert!(!alerts.mana_regen_needed);
    }

    #[test]
    fn test_derive_is_repeatable() {
        let s = snapshot(12, 5);
        let copy = s.clone();
        assert_eq!(derive(&s), derive(&copy));
        assert_eq!(derive(&s), AlertSet::from(&s));
    }

    #[test]
    fn test_active_order() {
        let mut s = snapshot(10, 10);
        s.tp_alert = true;
        let active: Vec<Alert> = derive(&s).active().collect();
        assert_eq!(
            active,
            vec![Alert::LowHealth, Alert::LowMana, Alert::TeleportMissing]
        );
        assert!(!derive(&snapshot(50, 50)).any());
    }
}
