use crate::infra::{build_service, parse_date, ApiService};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use outpass::config::CalendarConfig;
use outpass::error::AppError;
use outpass::workflows::outpass::{
    legal_actions, policy, Actor, ActorRole, Calendar, DayType, DecisionKind, OutpassError,
    OutpassFilter, OutpassRequest, OutpassSubmission, WorkweekCalendar,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First candidate leave date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Extra holiday to load into the calendar (repeatable).
    #[arg(long = "holiday", value_parser = parse_date)]
    pub(crate) holidays: Vec<NaiveDate>,
    /// Print the final record of each scenario as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

struct Cast {
    parent: Actor,
    mentor: Actor,
    warden: Actor,
    admin: Actor,
}

impl Cast {
    fn new() -> Self {
        Self {
            parent: Actor::new("parent-demo", ActorRole::Parent),
            mentor: Actor::new("mentor-demo", ActorRole::Mentor),
            warden: Actor::new("warden-demo", ActorRole::Warden),
            admin: Actor::new("admin-demo", ActorRole::Admin),
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start,
        holidays,
        json,
    } = args;

    let start = start.unwrap_or_else(|| Local::now().date_naive());
    let calendar_config = CalendarConfig { holidays };
    let calendar = WorkweekCalendar::from_config(&calendar_config);
    let weekday = next_matching(&calendar, start, DayType::Weekday);
    let weekend = next_matching(&calendar, start, DayType::WeekendOrHoliday);

    let service = build_service(&calendar_config);
    let cast = Cast::new();

    println!("Outpass routing demo");
    println!("- Next weekday leave date: {weekday}");
    println!("- Next weekend/holiday leave date: {weekend}");

    println!("\nWeekday request (mentor, then warden)");
    let record = service.submit(submission(weekday, 1), &cast.parent)?;
    describe_submission(&record);
    let record = step(
        &service,
        &record,
        &cast.mentor,
        DecisionKind::Approve,
        Some("Guardian confirmed"),
    )?;
    let record = step(&service, &record, &cast.warden, DecisionKind::Approve, None)?;
    print_json(json, &record);

    println!("\nWeekend request (warden only)");
    let record = service.submit(submission(weekend, 1), &cast.parent)?;
    describe_submission(&record);
    let record = step(&service, &record, &cast.mentor, DecisionKind::Approve, None)?;
    let record = step(&service, &record, &cast.warden, DecisionKind::Approve, None)?;
    print_json(json, &record);

    println!("\nMentor rejection closes the request");
    let record = service.submit(submission(weekday, 2), &cast.parent)?;
    describe_submission(&record);
    let record = step(&service, &record, &cast.mentor, DecisionKind::Reject, None)?;
    let record = step(&service, &record, &cast.warden, DecisionKind::Approve, None)?;
    print_json(json, &record);

    println!("\nReturn before departure");
    match service.submit(submission_returning(weekday), &cast.parent) {
        Ok(record) => println!("  Unexpectedly accepted request {}", record.id()),
        Err(err) => println!("  Refused at intake: {err}"),
    }

    let pending = service.pending_for(&cast.warden)?;
    println!("\nWarden queue: {} waiting", pending.len());
    let history = service.history(&cast.parent, OutpassFilter::default())?;
    println!("Parent history: {} requests", history.len());
    for record in &history {
        println!(
            "  - #{} {} leaving {} -> {}",
            record.id(),
            record.day_type(),
            record.out_date(),
            record.status()
        );
    }

    let stats = service.statistics(&cast.admin)?;
    println!("\nStatistics");
    println!(
        "- total {} | pending {} | approved {} | rejected {}",
        stats.total, stats.pending, stats.approved, stats.rejected
    );
    println!(
        "- mentor approved {} | warden approved {}",
        stats.mentor_approved, stats.warden_approved
    );

    Ok(())
}

/// Attempt one decision and print the outcome. Refusals are reported, not raised.
fn step(
    service: &ApiService,
    record: &OutpassRequest,
    actor: &Actor,
    kind: DecisionKind,
    remarks: Option<&str>,
) -> Result<OutpassRequest, AppError> {
    let result = service.act(record.id(), actor, kind, remarks.map(str::to_string));

    match result {
        Ok(updated) => {
            println!(
                "  {} {}s: {} -> {}",
                actor.role,
                kind,
                record.status(),
                updated.status()
            );
            Ok(updated)
        }
        Err(OutpassError::Forbidden(reason)) => {
            println!("  {} cannot {}: {}", actor.role, kind, reason);
            Ok(record.clone())
        }
        Err(err) => Err(err.into()),
    }
}

fn describe_submission(record: &OutpassRequest) {
    println!(
        "- Submitted #{} ({}) -> {}, first approver {}",
        record.id(),
        record.day_type(),
        record.status(),
        policy::first_approver(record.day_type())
    );
    for role in [ActorRole::Mentor, ActorRole::Warden] {
        let actions = legal_actions(record.day_type(), record.status(), role);
        let labels: Vec<_> = actions
            .actions()
            .iter()
            .map(|kind| kind.label())
            .collect();
        println!("  {role} may: {}", display_actions(&labels));
    }
}

fn display_actions(labels: &[&str]) -> String {
    if labels.is_empty() {
        "nothing".to_string()
    } else {
        labels.join(", ")
    }
}

fn print_json(enabled: bool, record: &OutpassRequest) {
    if !enabled {
        return;
    }
    match serde_json::to_string_pretty(record) {
        Ok(json) => println!("  Record payload:\n{json}"),
        Err(err) => println!("  Record payload unavailable: {err}"),
    }
}

fn next_matching(calendar: &impl Calendar, start: NaiveDate, day_type: DayType) -> NaiveDate {
    let mut date = start;
    while calendar.classify(date) != day_type {
        date += Duration::days(1);
    }
    date
}

fn submission(out_date: NaiveDate, nights: i64) -> OutpassSubmission {
    OutpassSubmission {
        student_name: Some("Demo Student".to_string()),
        student_id: Some("DEMO-001".to_string()),
        guardian_name: Some("Demo Guardian".to_string()),
        guardian_number: Some("9000000000".to_string()),
        out_date: Some(format!("{out_date}T09:00")),
        in_date: Some(format!("{}T18:00", out_date + Duration::days(nights))),
        reason: Some("Family visit".to_string()),
    }
}

fn submission_returning(out_date: NaiveDate) -> OutpassSubmission {
    OutpassSubmission {
        in_date: Some(format!("{}T18:00", out_date - Duration::days(1))),
        ..submission(out_date, 1)
    }
}
