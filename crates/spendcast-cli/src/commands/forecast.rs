//! Forecast commands: train, predict, insights, model status

use anyhow::{bail, Result};
use chrono::NaiveDate;
use spendcast_core::{forecast::training_failure_message, FailureReason, Forecaster};

pub fn cmd_train(forecaster: &Forecaster, user_id: i64, as_of: Option<NaiveDate>) -> Result<()> {
    println!("🧠 Training expense model for user {}...", user_id);

    let result = match as_of {
        Some(date) => forecaster.train_as_of(user_id, date),
        None => forecaster.train(user_id),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => match training_failure_message(&e) {
            Some(msg) => bail!("{}", msg),
            None => return Err(e.into()),
        },
    };

    println!(
        "   Ledger: {} expenses, {} incomes",
        summary.expense_records, summary.income_records
    );
    println!("   Monthly samples: {}", summary.samples);
    println!(
        "   Fit: expense ≈ {:.2} + {:.2} × z(income)",
        summary.artifact.intercept, summary.artifact.slope
    );
    if let Some(refresh) = &summary.insights {
        println!(
            "   Insights: {} categories in bracket {}",
            refresh.categories, refresh.income_bracket
        );
    }
    println!("✅ {}", summary.message());

    Ok(())
}

pub fn cmd_predict(forecaster: &Forecaster, user_id: i64, income: f64, json: bool) -> Result<()> {
    let prediction = match forecaster.predict(user_id, income) {
        Ok(p) => p,
        Err(e) => match FailureReason::of(&e) {
            Some(reason) => bail!("{}", reason.message(&e)),
            None => return Err(e.into()),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    println!("🔮 Prediction for user {}", user_id);
    println!("   Income:            {:>14.2}", prediction.income);
    println!("   Predicted expense: {:>14.2}", prediction.predicted_expense);
    println!("   Savings potential: {:>14.2}", prediction.savings_potential);

    let Some(insights) = prediction.insights else {
        println!();
        println!("   No category insights yet for this income level.");
        return Ok(());
    };

    println!();
    println!("📊 Typical spending ({})", insights.income_bracket);
    for insight in &insights.category_insights {
        println!(
            "   {:<20} {:>6.1}%",
            insight.category,
            insight.avg_percentage * 100.0
        );
    }

    for warning in &insights.warnings {
        println!();
        println!("⚠️  {}", warning);
    }
    if !insights.suggestions.is_empty() {
        println!();
        println!("💡 Suggestions");
        for suggestion in &insights.suggestions {
            println!("   - {}", suggestion);
        }
    }

    Ok(())
}

pub fn cmd_insights(forecaster: &Forecaster, user_id: i64, json: bool) -> Result<()> {
    let insights = forecaster.list_insights(user_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    if insights.is_empty() {
        println!("No insights for user {}. Train a model first.", user_id);
        return Ok(());
    }

    println!("📊 Category insights for user {}", user_id);
    println!("   ─────────────────────────────────────────────");
    for insight in &insights {
        println!(
            "   {:<18} {:<20} {:>6.1}%",
            insight.income_bracket.label(),
            insight.category,
            insight.avg_percentage * 100.0
        );
    }

    Ok(())
}

pub fn cmd_model(forecaster: &Forecaster, user_id: i64) -> Result<()> {
    match forecaster.model_status(user_id)? {
        Some(model) => {
            println!("🧠 Model for user {}", user_id);
            println!("   Storage key:  {}", model.storage_key);
            println!("   Backend:      {}", forecaster.store().backend_name());
            println!("   Samples:      {}", model.sample_count);
            println!(
                "   Last trained: {}",
                model.last_trained.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => {
            println!("No model trained for user {}.", user_id);
            println!("Train one with: spendcast train --user {}", user_id);
        }
    }

    Ok(())
}

pub fn cmd_model_reset(forecaster: &Forecaster, user_id: i64) -> Result<()> {
    if forecaster.reset_model(user_id)? {
        println!("🗑️  Removed model for user {}", user_id);
    } else {
        println!("No model trained for user {}.", user_id);
    }
    Ok(())
}
