//! End-to-end demand scenarios over synthetic monthly and weekly cohorts.

use chrono::{Days, Months, NaiveDate};

use drugdemand_nirsevimab::{
    demand_by_time, season_totals, BirthCohort, Interval, NirsevimabCalculator, NirsevimabError,
    ScenarioParams, WeightForAge,
};
use drugdemand_population::{PopulationConfig, PopulationStore, TraversalOrder};

// ── Helpers ─────────────────────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 24 monthly cohorts of 100 births, April 2023 to March 2025.
fn monthly_births() -> Vec<BirthCohort> {
    (0..24)
        .map(|i| BirthCohort::new(d(2023, 4, 1) + Months::new(i), 100.0))
        .collect()
}

fn monthly_weights() -> Vec<WeightForAge> {
    [(0, 0.0), (1, 0.2), (2, 0.5), (3, 0.3)]
        .into_iter()
        .map(|(age, p)| WeightForAge::new(age, p, Interval::Month))
        .collect()
}

fn season(uptake: f64, p_high_risk: f64) -> ScenarioParams {
    ScenarioParams::new(uptake, p_high_risk, d(2024, 10, 1), d(2025, 3, 31))
}

fn total_doses(calc: &NirsevimabCalculator) -> f64 {
    season_totals(calc.rows()).values().sum()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn first_season_dosage_split() {
    let calc = NirsevimabCalculator::new(season(1.0, 0.0), &monthly_births(), &monthly_weights())
        .unwrap();
    let totals = season_totals(calc.rows());

    // 13 cohorts under 8 months; in-season births are all under 5kg,
    // September and August cohorts are partly over.
    assert!(close(totals["50mg"], 600.0 + 80.0 + 30.0));
    assert!(close(totals["100mg"], 1300.0 - 710.0));
    assert!(close(calc.total_births(), 2400.0));
}

#[test]
fn high_risk_second_season_doubles_doses() {
    let calc = NirsevimabCalculator::new(season(1.0, 0.1), &monthly_births(), &monthly_weights())
        .unwrap();
    // 11 cohorts aged 8 to 18 months at season start
    assert!(close(total_doses(&calc), 1300.0 + 11.0 * 100.0 * 0.1 * 2.0));

    let second_season: f64 = calc
        .rows()
        .iter()
        .filter(|r| r.attribute("risk_level") == Some("high") && r.n_doses > r.size)
        .map(|r| r.n_doses)
        .sum();
    assert!(close(second_season, 220.0));
}

#[test]
fn doses_scale_with_uptake() {
    let full = NirsevimabCalculator::new(season(1.0, 0.05), &monthly_births(), &monthly_weights())
        .unwrap();
    let half = NirsevimabCalculator::new(season(0.5, 0.05), &monthly_births(), &monthly_weights())
        .unwrap();
    assert!(close(total_doses(&half) * 2.0, total_doses(&full)));
}

#[test]
fn in_season_births_are_dosed_at_birth() {
    let calc = NirsevimabCalculator::new(season(1.0, 0.0), &monthly_births(), &monthly_weights())
        .unwrap();
    let by_time = demand_by_time(calc.rows());

    assert!(by_time.keys().all(|(t, _)| *t >= d(2024, 10, 1) && *t <= d(2025, 3, 31)));
    for month in 1..6 {
        let date = d(2024, 10, 1) + Months::new(month);
        assert!(close(by_time[&(date, "50mg".to_string())], 100.0));
    }
    // pre-season cohorts join the October 1 in-season cohort
    assert!(close(by_time[&(d(2024, 10, 1), "50mg".to_string())], 100.0 + 80.0 + 30.0));
}

#[test]
fn unread_characteristics_are_not_split() {
    let calc = NirsevimabCalculator::new(season(0.8, 0.1), &monthly_births(), &monthly_weights())
        .unwrap();
    let cross_product = 24 * 2 * 2 * 4;
    assert!(calc.populations() < cross_product);

    // dosage depends on weight, so every demand row has it resolved
    assert!(calc
        .rows()
        .iter()
        .all(|r| r.attribute("age_at_5kg") != Some("unresolved")));
}

#[test]
fn lazy_matches_eager_expansion() {
    let params = season(0.7, 0.1).with_delays([(0, 0.6), (1, 0.3), (2, 0.1)]);
    let births = monthly_births();
    let weights = monthly_weights();
    let lazy = NirsevimabCalculator::new(params.clone(), &births, &weights).unwrap();

    let config = PopulationConfig::default();
    let set = NirsevimabCalculator::characteristics(&params, &births, &weights, &config).unwrap();
    let mut store = PopulationStore::with_config(2400.0, set, config).unwrap();
    assert_eq!(store.expand_all().unwrap(), 24 * 2 * 2 * 4 * 3);

    let eager: f64 = store
        .map(|key, size| NirsevimabCalculator::calculate_demand(key, size, &params))
        .collect::<Result<Vec<_>, NirsevimabError>>()
        .unwrap()
        .into_iter()
        .filter_map(|(_, demand)| demand.map(|demand| demand.n_doses))
        .sum();

    assert!(close(eager, total_doses(&lazy)));
}

#[test]
fn traversal_order_does_not_change_demand() {
    let params = season(0.9, 0.2);
    let bfs = NirsevimabCalculator::new(params.clone(), &monthly_births(), &monthly_weights())
        .unwrap();
    let dfs = NirsevimabCalculator::with_config(
        params,
        &monthly_births(),
        &monthly_weights(),
        PopulationConfig::default().with_traversal(TraversalOrder::DepthFirst),
    )
    .unwrap();

    assert_eq!(bfs.rows().len(), dfs.rows().len());
    let a = demand_by_time(bfs.rows());
    let b = demand_by_time(dfs.rows());
    assert_eq!(a.len(), b.len());
    for (k, v) in &a {
        assert!(close(*v, b[k]));
    }
}

#[test]
fn weekly_cohorts() {
    let births: Vec<_> = (0..10)
        .map(|i| BirthCohort::new(d(2024, 9, 2) + Days::new(7 * i), 50.0))
        .collect();
    let weights: Vec<_> = [(0, 0.0), (4, 0.5), (8, 0.5)]
        .into_iter()
        .map(|(age, p)| WeightForAge::new(age, p, Interval::Week))
        .collect();
    let params = season(1.0, 0.0).with_interval(Interval::Week);

    let calc = NirsevimabCalculator::new(params, &births, &weights).unwrap();
    // every cohort is under 8 months during the season
    assert!(close(total_doses(&calc), 500.0));

    // weekly delays move the date by whole weeks
    let delayed = season(1.0, 0.0)
        .with_interval(Interval::Week)
        .with_delays([(2, 1.0)]);
    let calc = NirsevimabCalculator::new(delayed, &births, &weights).unwrap();
    assert!(calc
        .rows()
        .iter()
        .all(|r| r.time >= d(2024, 10, 15)));
}

#[test]
fn weight_interval_must_match() {
    let params = season(1.0, 0.0).with_interval(Interval::Week);
    let err = NirsevimabCalculator::new(params, &monthly_births(), &monthly_weights()).unwrap_err();
    assert!(matches!(err, NirsevimabError::InvalidInput(_)));
}

#[test]
fn scenario_from_json_is_carried_into_rows() {
    let params = ScenarioParams::from_json(
        r#"{
            "scenario": "middle_100",
            "uptake": 0.6,
            "p_high_risk": 0.02,
            "season_start": "2024-10-01",
            "season_end": "2025-03-31",
            "interval": "month",
            "delays": {"0": 0.8, "1": 0.2}
        }"#,
    )
    .unwrap();
    let calc = NirsevimabCalculator::new(params, &monthly_births(), &monthly_weights()).unwrap();

    let rows = calc.rows_with_params().unwrap();
    assert!(!rows.is_empty());
    for row in &rows {
        assert_eq!(row.parameters["scenario"], "middle_100");
        assert_eq!(row.parameters["delays"], "{0: 0.8, 1: 0.2}");
    }
}

#[test]
fn invalid_scenarios_are_rejected() {
    let bad_uptake = season(1.5, 0.0);
    assert!(matches!(
        NirsevimabCalculator::new(bad_uptake, &monthly_births(), &monthly_weights()),
        Err(NirsevimabError::InvalidScenario(_))
    ));

    let bad_delays = season(1.0, 0.0).with_delays([(0, 0.5)]);
    assert!(matches!(
        NirsevimabCalculator::new(bad_delays, &monthly_births(), &monthly_weights()),
        Err(NirsevimabError::InvalidScenario(_))
    ));

    assert!(matches!(
        NirsevimabCalculator::new(season(1.0, 0.0), &[], &monthly_weights()),
        Err(NirsevimabError::InvalidInput(_))
    ));
}
