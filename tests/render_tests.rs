/// Rendering properties — fallback, alternation distribution, robustness.
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use spintext::core::grammar::Template;
use spintext::{render, render_with, Context, Renderer};
use std::collections::HashMap;

fn city_ctx() -> Context {
    Context::from_pairs([("city_name", "Austin"), ("keyword", "wheelchair")])
}

#[test]
fn location_placeholder_scenario() {
    let ctx = Context::new().with("city_name", "Austin");
    assert_eq!(render("{location(city_name)}", &ctx), "Austin");
}

#[test]
fn unterminated_brace_scenario() {
    assert_eq!(render("Hello {unterminated", &Context::new()), "Hello {unterminated");
}

#[test]
fn call_or_contact_distribution() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut counts: HashMap<String, u32> = HashMap::new();
    for _ in 0..1000 {
        *counts
            .entry(render_with("{Call|Contact} us", &Context::new(), &mut rng))
            .or_default() += 1;
    }
    assert_eq!(counts.len(), 2, "unexpected outputs: {:?}", counts);
    assert!(counts["Call us"] >= 300, "{:?}", counts);
    assert!(counts["Contact us"] >= 300, "{:?}", counts);
}

#[test]
fn four_way_alternation_is_roughly_uniform() {
    let mut renderer = Renderer::seeded(11);
    let options = ["walker", "cane", "scooter", "wheelchair"];
    let mut counts = [0u32; 4];
    for _ in 0..4000 {
        let out = renderer.render("{walker|cane|scooter|wheelchair}", &Context::new());
        let i = options
            .iter()
            .position(|o| *o == out)
            .expect("output must be one option verbatim");
        counts[i] += 1;
    }
    for c in counts {
        assert!((800..=1200).contains(&c), "{:?}", counts);
    }
}

#[test]
fn mixed_template_uses_context_and_one_option() {
    let mut renderer = Renderer::seeded(5);
    for _ in 0..50 {
        let out = renderer.render("{Rent|Hire} a {keyword} in {location(city_name)}", &city_ctx());
        assert!(
            out == "Rent a wheelchair in Austin" || out == "Hire a wheelchair in Austin",
            "{out}"
        );
    }
}

#[test]
fn missing_keys_stay_visible() {
    let out = render("{keyword} in {location(zip_code)} call {phone}", &city_ctx());
    assert_eq!(out, "wheelchair in {location(zip_code)} call {phone}");
}

proptest! {
    #[test]
    fn render_never_panics(input in ".*", seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let _ = render_with(&input, &city_ctx(), &mut rng);
    }

    #[test]
    fn brace_heavy_input_never_panics(input in "[{}|a-c()location ]{0,40}", seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let _ = render_with(&input, &city_ctx(), &mut rng);
    }

    #[test]
    fn parse_reconstructs_source(input in "[{}|a-z_() ]{0,60}") {
        prop_assert_eq!(Template::parse(&input).source(), input);
    }

    #[test]
    fn token_free_templates_render_unchanged(input in "[^{}]*") {
        prop_assert_eq!(render(&input, &city_ctx()), input.clone());
        prop_assert_eq!(render(&input, &city_ctx()), render(&input, &city_ctx()));
    }

    #[test]
    fn present_key_resolves(key in "[a-z_]{1,12}", value in "[^{}]{0,20}") {
        let ctx = Context::new().with(key.as_str(), value.as_str());
        prop_assert_eq!(render(&format!("{{{}}}", key), &ctx), value);
    }

    #[test]
    fn absent_key_falls_back(key in "[a-z_]{1,12}") {
        let token = format!("{{{}}}", key);
        prop_assert_eq!(render(&token, &Context::new()), token.clone());
    }
}
