//! Presenter
//!
//! Maps a `SessionStatus` to a render-ready `ViewModel`. Nothing here holds
//! state: the same status always presents the same way.

use crate::data::{Alert, AlertSet, BuybackStatus, Snapshot};
use crate::session::SessionStatus;

/// Internal name prefix carried by every hero identifier.
pub static HERO_NAME_PREFIX: &str = "npc_dota_hero_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewModel {
    /// No socket.
    AwaitingConnection,
    /// Socket open, no match data yet.
    AwaitingData,
    Dashboard(DashboardView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub hero: String,
    pub clock: String,
    pub kda: String,
    pub strategy: StrategyView,
    pub health: VitalView,
    pub mana: VitalView,
    pub gold: u32,
    pub gpm: i32,
    pub last_hits: u32,
    pub denies: u32,
    pub buyback: BuybackView,
    pub alerts: AlertSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyView {
    pub text: String,
    pub warn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalView {
    pub percent: u8,
    pub low: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuybackView {
    Ready,
    Cooldown,
    NoGold { shortfall: u32 },
}

impl BuybackView {
    pub fn label(&self) -> &'static str {
        match self {
            BuybackView::Ready => "READY",
            BuybackView::Cooldown => "ON COOLDOWN",
            BuybackView::NoGold { .. } => "NO GOLD",
        }
    }
}

impl ViewModel {
    /// Status line for the waiting views.
    pub fn headline(&self) -> Option<&'static str> {
        match self {
            ViewModel::AwaitingConnection => Some("Awaiting connection..."),
            ViewModel::AwaitingData => Some("Connected, awaiting match data..."),
            ViewModel::Dashboard(_) => None,
        }
    }

    pub fn dashboard(&self) -> Option<&DashboardView> {
        match self {
            ViewModel::Dashboard(view) => Some(view),
            _ => None,
        }
    }
}

impl DashboardView {
    pub fn new(snapshot: &Snapshot, alerts: &AlertSet) -> DashboardView {
        DashboardView {
            hero: hero_label(&snapshot.hero_name),
            clock: snapshot.clock_display.clone(),
            kda: snapshot.kda.clone(),
            strategy: StrategyView {
                text: snapshot.strategy_text.clone(),
                warn: snapshot.strategy_warn,
            },
            health: VitalView {
                percent: snapshot.health_percent,
                low: alerts.low_health,
            },
            mana: VitalView {
                percent: snapshot.mana_percent,
                low: alerts.low_mana,
            },
            gold: snapshot.gold,
            gpm: snapshot.gpm,
            last_hits: snapshot.last_hits,
            denies: snapshot.denies,
            buyback: match snapshot.buyback_status {
                BuybackStatus::Ready => BuybackView::Ready,
                BuybackStatus::Cooldown => BuybackView::Cooldown,
                BuybackStatus::NoGold => BuybackView::NoGold {
                    shortfall: snapshot.buyback_missing,
                },
            },
            alerts: *alerts,
        }
    }

    /// Alert banners to show, in display order.
    pub fn banners(&self) -> Vec<Alert> {
        self.alerts.active().collect()
    }
}

/// Display name for a hero identifier: "npc_dota_hero_shadow_shaman"
/// becomes "SHADOW SHAMAN". An empty identifier renders as "---".
pub fn hero_label(hero_name: &str) -> String {
    let name = hero_name.strip_prefix(HERO_NAME_PREFIX).unwrap_or(hero_name);
    if name.is_empty() {
        return "---".to_string();
    }
    name.to_uppercase().replace('_', " ")
}

pub fn present(status: &SessionStatus) -> ViewModel {
    match status {
        SessionStatus::Disconnected => ViewModel::AwaitingConnection,
        SessionStatus::Connected => ViewModel::AwaitingData,
        SessionStatus::HasData { snapshot, alerts } => {
            ViewModel::Dashboard(DashboardView::new(snapshot, alerts))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{decode, derive};
    use std::sync::Arc;

    const LINA: &str = r#"{
        "hero_name": "npc_dota_hero_lina",
        "clock_display": "14:02",
        "strategy_text": "Wisdom rune at 14:00",
        "strategy_warn": true,
        "health_percent": 25,
        "mana_percent": 50,
        "gold": 1650,
        "last_hits": 102,
        "denies": 11,
        "buyback_status": "NO_GOLD",
        "buyback_missing": 350,
        "gpm": 545,
        "kda": "6/3/4",
        "wand_alert": false,
        "tp_alert": false,
        "hp_regen_alert": false,
        "mana_regen_alert": false
    }"#;

    fn has_data(raw: &str) -> SessionStatus {
        let snapshot = decode(raw).unwrap();
        let alerts = derive(&snapshot);
        SessionStatus::HasData {
            snapshot: Arc::new(snapshot),
            alerts,
        }
    }

    #[test]
    fn test_waiting_views() {
        let view = present(&SessionStatus::Disconnected);
        assert_eq!(view, ViewModel::AwaitingConnection);
        assert_eq!(view.headline(), Some("Awaiting connection..."));
        assert!(view.dashboard().is_none());

        let view = present(&SessionStatus::Connected);
        assert_eq!(view, ViewModel::AwaitingData);
        assert_eq!(view.headline(), Some("Connected, awaiting match data..."));
    }

    #[test]
    fn test_lina_dashboard() {
        let view = present(&has_data(LINA));
        let dash = view.dashboard().unwrap();
        assert_eq!(dash.hero, "LINA");
        assert_eq!(dash.clock, "14:02");
        assert_eq!(dash.kda, "6/3/4");
        assert!(dash.alerts.low_health);
        assert!(!dash.alerts.low_mana);
        assert_eq!(dash.health, VitalView { percent: 25, low: true });
        assert_eq!(dash.mana, VitalView { percent: 50, low: false });
        assert_eq!(dash.buyback, BuybackView::NoGold { shortfall: 350 });
        assert_eq!(dash.buyback.label(), "NO GOLD");
        assert_eq!(dash.gold, 1650);
        assert_eq!(dash.gpm, 545);
        assert_eq!((dash.last_hits, dash.denies), (102, 11));
        assert!(dash.strategy.warn);
        assert_eq!(dash.banners(), vec![Alert::LowHealth]);
        assert_eq!(view.headline(), None);
    }

    #[test]
    fn test_hero_labels() {
        assert_eq!(hero_label("npc_dota_hero_lina"), "LINA");
        assert_eq!(hero_label("npc_dota_hero_shadow_shaman"), "SHADOW SHAMAN");
        assert_eq!(hero_label("npc_dota_hero_skeleton_king_x"), "SKELETON KING X");
        assert_eq!(hero_label("custom_hero"), "CUSTOM HERO");
        assert_eq!(hero_label(""), "---");
        assert_eq!(hero_label("npc_dota_hero_"), "---");
    }

    #[test]
    fn test_buyback_views() {
        let ready = LINA.replace("\"NO_GOLD\"", "\"READY\"");
        let dash = present(&has_data(&ready)).dashboard().cloned().unwrap();
        assert_eq!(dash.buyback, BuybackView::Ready);

        let cooldown = LINA.replace("\"NO_GOLD\"", "\"COOLDOWN\"");
        let dash = present(&has_data(&cooldown)).dashboard().cloned().unwrap();
        assert_eq!(dash.buyback, BuybackView::Cooldown);
        assert_eq!(dash.buyback.label(), "ON COOLDOWN");
    }

    #[test]
    fn test_present_is_repeatable() {
        let status = has_data(LINA);
        assert_eq!(present(&status), present(&status.clone()));
    }
}
