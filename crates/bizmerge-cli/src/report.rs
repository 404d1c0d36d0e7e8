//! Human-readable and JSON rendering of command results.

use bizmerge_core::{
    AggregatedBusinessData, ConsistencyValidationResult, DataConsistencyIssue,
    DataIntegrityResult, FieldConsistencyResult, FixtureFile,
};
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_fixture_list(fixtures: &FixtureFile) {
    println!("{:<24} {:>9} {:>6}", "BUSINESS", "LOCATIONS", "SITES");
    for business in &fixtures.businesses {
        let sites: usize = business.locations.iter().map(|l| l.sites.len()).sum();
        println!(
            "{:<24} {:>9} {:>6}",
            business.id,
            business.locations.len(),
            sites
        );
    }
}

pub(crate) fn print_aggregate(aggregate: &AggregatedBusinessData) {
    println!("{} ({})", aggregate.business_name, aggregate.business_id);
    if let Some(primary) = &aggregate.primary_location {
        println!("  primary:      {}", primary.url);
    }
    println!("  locations:    {}", aggregate.locations.len());
    println!("  site records: {}", aggregate.site_data_count());
    println!("  consistency:  {:.3}", aggregate.consistency_score);
    println!("  completeness: {:.3}", aggregate.completeness_score);
    println!("  quality:      {:.3}", aggregate.quality_score);
    println!("  method:       {}", aggregate.aggregation_method);

    for (category, fields) in &aggregate.merged_data {
        println!();
        println!("[{category}]");
        for (name, value) in fields {
            println!("  {name}: {value}");
        }
    }
    print_issues(&aggregate.consistency_issues);
}

pub(crate) fn print_consistency(result: &ConsistencyValidationResult) {
    println!(
        "{}: {:.3} ({}) across {} sites",
        result.business_id, result.overall_score, result.level, result.site_count
    );
    for field in &result.field_results {
        println!(
            "  {:<20} {:.3} {:<6} {}",
            field.field_name,
            field.score,
            field.level,
            if field.is_consistent { "ok" } else { "issues" }
        );
    }
    print_issues(&result.issues);
}

pub(crate) fn print_field(result: &FieldConsistencyResult) {
    println!(
        "{}: {:.3} ({}), {} values",
        result.field_name,
        result.score,
        result.level,
        result.values.len()
    );
    for value in &result.values {
        println!("  {} [{}] {}", value.location_id, value.category, value.value);
    }
    print_issues(&result.issues);
}

pub(crate) fn print_integrity(business_id: &str, result: &DataIntegrityResult) {
    println!(
        "{business_id}: integrity {:.3} ({})",
        result.integrity_score,
        if result.is_valid { "valid" } else { "invalid" }
    );
    for issue in &result.issues {
        println!("  issue:   {issue}");
    }
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
}

fn print_issues(issues: &[DataConsistencyIssue]) {
    if issues.is_empty() {
        return;
    }
    println!();
    println!("issues:");
    for issue in issues {
        println!(
            "  [{}] {} {}: {}",
            issue.severity, issue.issue_type, issue.field_name, issue.description
        );
        println!("      -> {}", issue.recommendation);
    }
}
