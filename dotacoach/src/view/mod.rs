mod presenter;

pub use presenter::{
    hero_label, present, BuybackView, DashboardView, StrategyView, ViewModel, VitalView,
    HERO_NAME_PREFIX,
};
