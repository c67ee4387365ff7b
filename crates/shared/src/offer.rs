//! Static copy shown on the premium offer screen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub icon: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Testimonial {
    pub avatar: &'static str,
    pub name: &'static str,
    pub text: &'static str,
}

pub const HEADLINE: &str = "Unlock All Features";
pub const SUBHEADLINE: &str =
    "Unlimited station, favorite and detail access. Real-time updated map and more!";
pub const RATING: &str = "4.9";
pub const REVIEWS_LABEL: &str = "2,300+ reviews";
pub const CONTINUE_LABEL: &str = "Continue";
pub const RESTORE_LABEL: &str = "Restore Purchases";
pub const CANCEL_ANYTIME_LABEL: &str = "Cancel anytime";

pub const FEATURES: [Feature; 3] = [
    Feature {
        icon: "bolt.fill",
        text: "Real-time station status",
    },
    Feature {
        icon: "star.fill",
        text: "Save and manage favorites",
    },
    Feature {
        icon: "map.fill",
        text: "Unlimited detail & map access",
    },
];

pub const TESTIMONIALS: [Testimonial; 3] = [
    Testimonial {
        avatar: "ER",
        name: "Emily R.",
        text: "Super easy to use! I always find a charger nearby.",
    },
    Testimonial {
        avatar: "JD",
        name: "John D.",
        text: "Favorites and the map are so practical, highly recommend.",
    },
    Testimonial {
        avatar: "SL",
        name: "Sophia L.",
        text: "Real-time station info saves me so much time!",
    },
];
