use crate::output::{print_fields, print_json, print_list, print_table};
use provision_core::estimate::{self, Category, CostEstimate};

pub fn run(
    tier: Option<&str>,
    sample_data: bool,
    compare: bool,
    json: bool,
) -> anyhow::Result<()> {
    if compare {
        return run_compare(sample_data, json);
    }
    let Some(tier) = tier else {
        anyhow::bail!("--tier is required unless --compare is given");
    };

    let estimate = estimate::estimate(tier, sample_data)?;
    if json {
        return print_json(&estimate);
    }

    println!(
        "Cost estimate for the {} tier{}",
        estimate.tier,
        if estimate.include_seed_data {
            " (with sample data)"
        } else {
            ""
        }
    );
    println!();
    let rows = estimate
        .breakdown
        .iter()
        .map(|line| {
            vec![
                category_label(line.category).to_string(),
                line.count.to_string(),
                line.weight.to_string(),
                line.units.to_string(),
            ]
        })
        .collect();
    print_table(&["Category", "Count", "Weight", "Units"], rows);
    println!();
    print_fields(&[
        ("Total units", estimate.total_units.to_string()),
        ("Estimated time", estimate.duration_display()),
        ("Monthly price", format!("${}", estimate.monthly_price_usd)),
    ]);
    print_list("Recommendations", &estimate.recommendations);
    Ok(())
}

fn run_compare(sample_data: bool, json: bool) -> anyhow::Result<()> {
    let estimates = estimate::compare(sample_data);
    if json {
        return print_json(&estimates);
    }

    let rows = estimates
        .iter()
        .map(|e| {
            vec![
                e.tier.to_string(),
                count(e, Category::Databases),
                count(e, Category::Views),
                count(e, Category::Records),
                e.total_units.to_string(),
                e.duration_display(),
                format!("${}", e.monthly_price_usd),
            ]
        })
        .collect();
    print_table(
        &["Tier", "Databases", "Views", "Records", "Units", "Time", "Price/mo"],
        rows,
    );
    Ok(())
}

fn count(estimate: &CostEstimate, category: Category) -> String {
    estimate
        .line(category)
        .map(|l| l.count.to_string())
        .unwrap_or_else(|| "0".to_string())
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Databases => "databases",
        Category::Views => "views",
        Category::Fields => "fields",
        Category::Integrations => "integrations",
        Category::Automations => "automations",
        Category::Records => "sample records",
        Category::Overhead => "base overhead",
    }
}
