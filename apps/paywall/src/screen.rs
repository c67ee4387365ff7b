//! Plain-text rendering of the offer screen for terminal hosts.

use std::fmt::Write as _;

use shared::{
    domain::Plan,
    offer::{
        CANCEL_ANYTIME_LABEL, CONTINUE_LABEL, FEATURES, HEADLINE, RATING, RESTORE_LABEL,
        REVIEWS_LABEL, SUBHEADLINE, TESTIMONIALS,
    },
};

use crate::controller::PurchaseFlowController;

pub fn render_offer(controller: &PurchaseFlowController) -> String {
    let state = controller.state();
    let mut out = String::new();

    let close = if state.close_enabled() { "[x]" } else { "[ ]" };
    let _ = writeln!(out, "{close:>60}");
    let _ = writeln!(out, "{HEADLINE}");
    let _ = writeln!(out, "{SUBHEADLINE}");
    let _ = writeln!(out, "* {RATING} · {REVIEWS_LABEL}");
    let _ = writeln!(out);

    let testimonial = TESTIMONIALS[state.testimonial_index()];
    let _ = writeln!(
        out,
        "  ({}) {} *****",
        testimonial.avatar, testimonial.name
    );
    let _ = writeln!(out, "       {}", testimonial.text);
    let dots: Vec<&str> = (0..TESTIMONIALS.len())
        .map(|idx| if idx == state.testimonial_index() { "●" } else { "○" })
        .collect();
    let _ = writeln!(out, "  {}", dots.join(" "));
    let _ = writeln!(out);

    for feature in FEATURES {
        let _ = writeln!(out, "  + {}", feature.text);
    }
    let _ = writeln!(out);

    for plan in Plan::DISPLAY_ORDER {
        let marker = if plan == state.selected_plan() {
            "(•)"
        } else {
            "( )"
        };
        let badge = plan.badge().map(|b| format!("  [{b}]")).unwrap_or_default();
        let _ = writeln!(
            out,
            "{marker} {}{badge}  {} {}",
            plan.title(),
            controller.price(plan),
            plan.price_suffix()
        );
        if let Some(savings) = plan.savings() {
            let _ = writeln!(out, "    {savings}");
        }
    }
    let _ = writeln!(out);

    let button = if state.is_purchasing() {
        "..."
    } else {
        CONTINUE_LABEL
    };
    let _ = writeln!(out, "[ {button} ]");
    let _ = write!(out, "{RESTORE_LABEL} · {CANCEL_ANYTIME_LABEL}");
    out
}
