//! End-to-end pricing scenarios, fed through the JSON shapes the dashboard
//! sends.

use serde_json::json;
use tinsmith_core::formula::{evaluate, Evaluated};
use tinsmith_core::pricing::{recalculate_line, recalculate_order, resolve_price};
use tinsmith_core::tax::{aggregate_for_display, SummaryLabels, VatScenario};
use tinsmith_core::totals::line_total;
use tinsmith_core::types::{CalcValue, Discount, Order, OrderLine, Settings};
use tinsmith_core::Money;

fn settings() -> Settings {
    serde_json::from_value(json!({
        "price": [
            { "id": "", "parent": "Polyester", "title": "RAL9005", "price": "10", "unit": "m2", "public": "1" },
            { "id": "FOLD", "parent": "", "title": "Fold", "price": 0.35, "unit": "gab.", "public": false }
        ],
        "tax_percent": "21",
        "tax_display": "PVN 21%",
        "var_parent": "Zinc\nAluzinc"
    }))
    .unwrap()
}

fn line(value: serde_json::Value) -> OrderLine {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_formula_mode_area_price() {
    let line = line(json!({
        "qty": 2,
        "coating": "Polyester",
        "color": "RAL9005",
        "calc_price": "formula",
        "formula": "W*L",
        "formula_price": "0",
        "formula_width_calc": "300",
        "formula_length_calc": "500"
    }));

    let result = resolve_price(&settings(), &line);

    assert_eq!(result.price, Money::from_cents(150));
    assert_eq!(result.total, Money::from_cents(300));
}

#[test]
fn test_variable_mode_price() {
    let line = line(json!({
        "qty": "3",
        "coating": "Zinc",
        "color": "*",
        "calc_price": "variable",
        "var_price": [{ "parent": "Zinc", "title": "*", "price": "8.83" }]
    }));

    let result = resolve_price(&settings(), &line);

    assert_eq!(result.price.to_string(), "8.83");
    assert_eq!(result.total.to_string(), "26.49");
}

#[test]
fn test_discount_text_with_percent_sign() {
    let total = line_total(1.0, Money::from_cents(10000), 0.0, &Discount::Text("15%".into()));
    assert_eq!(total.to_string(), "85.00");
}

#[test]
fn test_reverse_charge_needs_long_tax_code() {
    let order: Order = serde_json::from_value(json!({
        "vat_status": "1",
        "items": [
            { "tax_id": "MET1", "qty": 1, "price": 100 },
            { "tax_id": "21", "qty": 1, "price": 50 }
        ]
    }))
    .unwrap();

    let summary = aggregate_for_display(&settings(), &order, &SummaryLabels::default());

    // Stored totals are stale (0) until recalculated.
    assert_eq!(summary.price.scenario, VatScenario::Empty);

    let mut order = order;
    for item in &mut order.items {
        item.total = line_total(item.qty, item.price, item.adj, &item.discount);
    }
    let summary = aggregate_for_display(&settings(), &order, &SummaryLabels::default());

    assert_eq!(summary.price.item_total_0, Money::from_cents(10000));
    assert_eq!(summary.price.item_total_21, Money::from_cents(5000));
    assert_eq!(summary.price.scenario, VatScenario::Mixed);
    assert_eq!(summary.price.reverse_charge_labels, vec!["§143"]);
}

#[test]
fn test_empty_and_malformed_formulas() {
    assert_eq!(evaluate(""), Evaluated::Number(0.0));
    assert_eq!(evaluate("1+*"), Evaluated::Blank);
}

#[test]
fn test_negative_total_clamps_to_zero() {
    let total = line_total(1.0, Money::from_cents(1000), -50.0, &Discount::Percent(0.0));
    assert_eq!(total, Money::zero());
}

#[test]
fn test_blank_width_survives_serialization() {
    let mut line = line(json!({
        "qty": 1,
        "coating": "Polyester",
        "color": "RAL9005",
        "formula": "W*L",
        "formula_width_calc": "300+",
        "formula_length_calc": 500
    }));

    recalculate_line(&settings(), &mut line);

    assert_eq!(line.formula_width_calc, CalcValue::Blank);
    assert_eq!(line.area, CalcValue::Blank);

    let json = serde_json::to_value(&line).unwrap();
    assert_eq!(json["formula_width_calc"], json!(""));
    assert_eq!(json["formula_length_calc"], json!(500.0));
    assert_eq!(json["price"], json!(0.0));
}

#[test]
fn test_full_order_round_trip() {
    let mut order: Order = serde_json::from_value(json!({
        "vat_status": "0",
        "items": [
            {
                "qty": 2,
                "coating": "Polyester",
                "color": "RAL9005",
                "formula": "W*L*COATING/COATING",
                "formula_price": "FOLD*2",
                "formula_width_calc": 1000,
                "formula_length_calc": 2000,
                "tax_id": "21"
            },
            {
                "qty": 1,
                "coating": "Zinc",
                "color": "*",
                "calc_price": "variable",
                "var_price": [{ "parent": "Zinc", "title": "*", "price": 5 }],
                "discount": "10%",
                "tax_id": "MET1"
            }
        ]
    }))
    .unwrap();

    let totals = recalculate_order(&settings(), &mut order);

    // Line 1: 1000 × 2000 × 10 / 10 = 2e6 mm² → 2 m² × 10 = 20.00 + 0.70
    assert_eq!(order.items[0].price.to_string(), "20.70");
    assert_eq!(order.items[0].total.to_string(), "41.40");
    assert_eq!(order.items[0].area, CalcValue::Number(2.0));
    assert_eq!(order.items[0].price_length, CalcValue::Number(10.35));
    // Line 2: 5.00 less 10%
    assert_eq!(order.items[1].total.to_string(), "4.50");

    assert_eq!(totals.total.to_string(), "45.90");
    // 45.90 × 21% = 9.639
    assert_eq!(totals.tax_total.to_string(), "9.64");
    assert_eq!(totals.grand_total.to_string(), "55.54");
    assert_eq!(order.price, totals);

    // Non-payer: everything is standard on the document too.
    let summary = aggregate_for_display(&settings(), &order, &SummaryLabels::default());
    assert_eq!(summary.price.scenario, VatScenario::StandardOnly);
    assert_eq!(summary.price.grand_total.to_string(), "55.54");
    assert!(summary.html_summary.contains("PVN 21%"));
}

#[test]
fn test_division_by_zero_prices_as_zero() {
    let mut order: Order = serde_json::from_value(json!({
        "vat_status": "0",
        "items": [
            {
                "qty": 1,
                "coating": "Polyester",
                "color": "RAL9005",
                "formula": "W*L",
                "formula_price": "1/0",
                "formula_width_calc": 1000,
                "formula_length_calc": 2000,
                "tax_id": "21"
            },
            { "qty": 2, "formula": "0/0", "formula_price": "1/0", "tax_id": "21" },
            { "qty": 3, "formula": "1/0", "formula_price": "-1/0", "tax_id": "21" },
            {
                "qty": 1,
                "coating": "Polyester",
                "color": "RAL9005",
                "formula": "W*L",
                "formula_width_calc": "1/0",
                "formula_length_calc": 500,
                "tax_id": "21"
            }
        ]
    }))
    .unwrap();

    let totals = recalculate_order(&settings(), &mut order);

    // Only the finite area part of line 1 carries money.
    assert_eq!(order.items[0].price.to_string(), "20.00");
    for item in &order.items[1..] {
        assert_eq!(item.price, Money::zero());
        assert_eq!(item.total, Money::zero());
    }
    assert_eq!(totals.total.to_string(), "20.00");
    assert_eq!(totals.tax_total.to_string(), "4.20");
    assert_eq!(totals.grand_total.to_string(), "24.20");

    let summary = aggregate_for_display(&settings(), &order, &SummaryLabels::default());
    assert_eq!(summary.price.grand_total.to_string(), "24.20");

    let json = serde_json::to_value(&order.items[3]).unwrap();
    assert_eq!(json["formula_width_calc"], json!(""));
}
