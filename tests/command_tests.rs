
use calendar_mock::{colored_event, timed_event, MockCalendar};
use calendar_sweeper::commands::{
    dedupe, delete_by_title, list_calendars, recolor, show_colors, CommandContext, DeleteOutcome,
};
use calendar_sweeper::components::sweep::KeywordRule;
use calendar_sweeper::config::parse_rules;
use chrono::{DateTime, Utc};

#[tokio::test]
async fn test_dedupe_deletes_later_copies() {
    let mock = MockCalendar::new(
        vec![
            timed_event("orig", "Study", "2024-01-01T10:00", "2024-01-01T11:00"),
            timed_event("dup1", "Study", "2024-01-01T10:00", "2024-01-01T11:00"),
            timed_event("other", "Swim", "2024-01-01T10:00", "2024-01-01T11:00"),
        ],
        2,
    );
    let ctx = CommandContext::new(&mock, "primary");

    let outcome = dedupe(&ctx).await.unwrap();

    assert_eq!(outcome.checked, 3);
    assert_eq!(outcome.found, 1);
    assert_eq!(outcome.report.succeeded, 1);
    let ids: Vec<String> = mock.events().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["orig".to_string(), "other".to_string()]);
}

#[tokio::test]
async fn test_dedupe_dry_run_changes_nothing() {
    let mock = MockCalendar::new(
        vec![
            timed_event("a", "Study", "2024-01-01T10:00", "2024-01-01T11:00"),
            timed_event("b", "Study", "2024-01-01T10:00", "2024-01-01T11:00"),
        ],
        10,
    );
    let ctx = CommandContext::new(&mock, "primary").dry_run(true);

    let outcome = dedupe(&ctx).await.unwrap();

    assert_eq!(outcome.found, 1);
    assert_eq!(outcome.report.attempted, 0);
    assert_eq!(mock.events().len(), 2);
    assert!(mock.submitted().is_empty());
}

#[tokio::test]
async fn test_dedupe_lists_recurring_events_unexpanded() {
    let mock = MockCalendar::new(Vec::new(), 10);
    dedupe(&CommandContext::new(&mock, "primary")).await.unwrap();
    assert!(!mock.queries()[0].single_events);
}

#[tokio::test]
async fn test_since_bounds_listing() {
    let since: DateTime<Utc> = "2024-09-01T00:00:00Z".parse().unwrap();
    let mock = MockCalendar::new(Vec::new(), 10);

    let ctx = CommandContext::new(&mock, "primary").since(Some(since));
    dedupe(&ctx).await.unwrap();
    let rules = vec![KeywordRule::new("swim", "7")];
    recolor(&ctx, &rules).await.unwrap();

    let queries = mock.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().all(|q| q.time_min == Some(since)));
    assert!(!queries[0].single_events);
    assert!(queries[1].single_events);
}

#[tokio::test]
async fn test_listing_is_unbounded_by_default() {
    let mock = MockCalendar::new(Vec::new(), 10);
    dedupe(&CommandContext::new(&mock, "primary")).await.unwrap();
    assert_eq!(mock.queries()[0].time_min, None);
}

#[tokio::test]
async fn test_recolor_with_configured_rules() {
    let rules = parse_rules(
        r#"
        [colors]
        classes = "5"
        "family and friends" = "2"

        [[rules]]
        keyword = "CHEM-"
        category = "classes"

        [[rules]]
        keyword = "Alex"
        category = "family and friends"
        "#,
    )
    .unwrap();
    let mock = MockCalendar::new(
        vec![
            colored_event("1", "CHEM-101 Lecture", None),
            colored_event("2", "CHEM-101 with Alex", Some("5")),
            colored_event("3", "Dinner with alex", Some("2")),
            colored_event("4", "Laundry", None),
        ],
        3,
    );
    let ctx = CommandContext::new(&mock, "primary");

    let outcome = recolor(&ctx, &rules).await.unwrap();

    assert_eq!(outcome.summary.checked, 4);
    assert_eq!(outcome.summary.updated, 2);
    assert_eq!(outcome.summary.already_correct, 1);
    assert_eq!(outcome.summary.unmatched, 1);
    assert_eq!(outcome.report.succeeded, 2);
    assert!(mock.queries().iter().all(|q| q.single_events));

    let colors: Vec<Option<String>> = mock.events().into_iter().map(|e| e.color_id).collect();
    assert_eq!(
        colors,
        vec![
            Some("5".to_string()),
            Some("2".to_string()),
            Some("2".to_string()),
            None
        ]
    );

    // A second run finds nothing left to change
    let again = recolor(&ctx, &rules).await.unwrap();
    assert_eq!(again.summary.updated, 0);
    assert_eq!(again.report.attempted, 0);
}

#[tokio::test]
async fn test_recolor_without_rules_does_not_list() {
    let mock = MockCalendar::new(vec![colored_event("1", "CHEM-101", None)], 10);
    let outcome = recolor(&CommandContext::new(&mock, "primary"), &[]).await.unwrap();
    assert_eq!(outcome.summary.checked, 0);
    assert!(mock.page_requests().is_empty());
}

#[tokio::test]
async fn test_recolor_reports_rejected_updates() {
    let rules = parse_rules(
        r#"
        [[rules]]
        keyword = "swim"
        color = "7"
        "#,
    )
    .unwrap();
    let mock = MockCalendar::new(
        vec![
            colored_event("1", "Swim", None),
            colored_event("2", "Swim meet", None),
            colored_event("3", "SWIM", None),
        ],
        10,
    )
    .reject("2");

    let outcome = recolor(&CommandContext::new(&mock, "primary"), &rules)
        .await
        .unwrap();

    assert_eq!(outcome.report.attempted, 3);
    assert_eq!(outcome.report.succeeded, 2);
    assert_eq!(outcome.report.failed, 1);
}

#[tokio::test]
async fn test_delete_by_title_not_found_is_informational() {
    let mock = MockCalendar::new(vec![colored_event("1", "Dentist", None)], 10);
    let outcome = delete_by_title(&CommandContext::new(&mock, "primary"), "Doctor")
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFound);
    assert_eq!(mock.events().len(), 1);
}

#[tokio::test]
async fn test_delete_by_title_removes_first_match() {
    let mock = MockCalendar::new(
        vec![
            colored_event("1", "Dentist", None),
            colored_event("2", "Dentist", None),
        ],
        1,
    );

    let outcome = delete_by_title(&CommandContext::new(&mock, "primary"), "Dentist")
        .await
        .unwrap();

    match outcome {
        DeleteOutcome::Applied(report) => assert!(report.is_clean()),
        other => panic!("unexpected outcome: {:?}", other),
    }
    let ids: Vec<String> = mock.events().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["2".to_string()]);
}

#[tokio::test]
async fn test_listing_commands_return_data() {
    let mock = MockCalendar::new(Vec::new(), 10);
    assert_eq!(list_calendars(&mock).await.unwrap().len(), 2);
    let colors = show_colors(&mock).await.unwrap();
    assert_eq!(colors.event["5"].background, "#fbd75b");
}
