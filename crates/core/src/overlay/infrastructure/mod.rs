pub mod rule_of_thirds_overlay;
