//! Property-based tests for the canonical model.
//!
//! These tests use proptest to check that paging, status and permission
//! invariants hold across randomly generated inputs.

use proptest::prelude::*;

use scmbridge::core::types::{
    CombinedStatus, ListOptions, Perm, PermissionLevel, RepoName, State, Status,
};
use scmbridge::forge::bitbucket::BitbucketStates;
use scmbridge::forge::github::GitHubStates;
use scmbridge::forge::stash::StashStates;
use scmbridge::forge::{Page, StatusVocabulary};

fn any_state() -> impl Strategy<Value = State> {
    prop::sample::select(State::ALL.to_vec())
}

fn any_level() -> impl Strategy<Value = PermissionLevel> {
    prop::sample::select(vec![
        PermissionLevel::None,
        PermissionLevel::Read,
        PermissionLevel::Write,
        PermissionLevel::Admin,
    ])
}

fn list_options() -> impl Strategy<Value = ListOptions> {
    (0u32..50, -5i32..100).prop_map(|(page, size)| ListOptions::new(page, size))
}

/// Strategy for `Link` headers with arbitrary, possibly contradictory,
/// page numbers.
fn link_header() -> impl Strategy<Value = String> {
    let rel = prop::sample::select(vec!["first", "next", "prev", "last", "alternate"]);
    prop::collection::vec((rel, 0u32..20), 0..5).prop_map(|links| {
        links
            .into_iter()
            .map(|(rel, n)| {
                format!(
                    "<https://api.github.com/resource?per_page=30&page={}>; rel=\"{}\"",
                    n, rel
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    })
}

fn status(state: State) -> Status {
    Status {
        state,
        ..Default::default()
    }
}

/// Invariants every normalised page must satisfy.
fn check_page(page: Page, item_count: usize) -> Result<(), TestCaseError> {
    prop_assert_eq!(page.first, 1);
    if item_count == 0 {
        prop_assert_eq!(page.next, 0);
    }
    if page.next != 0 {
        prop_assert!(page.next >= page.first);
        prop_assert!(page.prev == 0 || page.prev < page.next, "{:?}", page);
        prop_assert!(page.last == 0 || page.next <= page.last, "{:?}", page);
    }
    if page.last != 0 {
        prop_assert!(page.last >= page.first);
    }
    Ok(())
}

/// The law every vocabulary must satisfy.
fn check_vocabulary<V: StatusVocabulary>(state: State) -> Result<(), TestCaseError> {
    let native = V::from_canonical(state);
    let read_back = V::to_canonical(native);
    if V::native_states().contains(&state) {
        prop_assert_eq!(read_back, state);
    }
    // Writing what was read back emits the same token again.
    prop_assert_eq!(V::from_canonical(read_back), native);
    Ok(())
}

proptest! {
    #[test]
    fn cursor_page_invariants(
        opts in list_options(),
        count in 0usize..40,
        next in prop::option::of(0u32..60),
        prev in prop::option::of(0u32..60),
    ) {
        let page = Page::from_cursor(opts, count, next, prev);
        check_page(page, count)?;
        if page.next != 0 {
            prop_assert!(page.next > opts.effective_page());
        }
    }

    #[test]
    fn last_page_flag_invariants(opts in list_options(), count in 0usize..40, last in any::<bool>()) {
        let page = Page::from_last_page_flag(opts, count, last);
        check_page(page, count)?;
        prop_assert_eq!(page.last, 0);
        if last {
            prop_assert_eq!(page.next, 0);
        }
    }

    #[test]
    fn overflow_invariants(opts in list_options(), count in 0usize..40, found in any::<bool>()) {
        let page = Page::from_overflow(opts, count, found);
        check_page(page, count)?;
        // A short page never has a successor, whatever the probe said.
        if let Some(size) = opts.effective_size() {
            if count < size as usize {
                prop_assert_eq!(page.next, 0);
            }
        }
    }

    #[test]
    fn link_header_invariants(header in link_header(), count in 0usize..40) {
        check_page(Page::from_link_header(Some(&header), count), count)?;
    }

    #[test]
    fn garbage_link_header_degrades(header in "[ -~]{0,80}", count in 0usize..40) {
        let page = Page::from_link_header(Some(&header), count);
        check_page(page, count)?;
    }

    #[test]
    fn stash_vocabulary_law(state in any_state()) {
        check_vocabulary::<StashStates>(state)?;
    }

    #[test]
    fn bitbucket_vocabulary_law(state in any_state()) {
        check_vocabulary::<BitbucketStates>(state)?;
    }

    #[test]
    fn github_vocabulary_law(state in any_state()) {
        check_vocabulary::<GitHubStates>(state)?;
    }

    #[test]
    fn unrecognised_tokens_read_unknown(token in "[a-z]{1,12}") {
        // Both Bitbucket vocabularies use upper-case tokens.
        prop_assert_eq!(StashStates::to_canonical(&token), State::Unknown);
        prop_assert_eq!(BitbucketStates::to_canonical(&token), State::Unknown);
    }

    #[test]
    fn perm_is_monotonic(a in any_level(), b in any_level()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (lo, hi) = (Perm::from_level(lo), Perm::from_level(hi));
        prop_assert!(!lo.pull || hi.pull);
        prop_assert!(!lo.push || hi.push);
        prop_assert!(!lo.admin || hi.admin);
    }

    #[test]
    fn perm_level_round_trip(level in any_level()) {
        let perm = Perm::from_level(level);
        prop_assert_eq!(perm.level(), level);
        prop_assert!(!perm.admin || perm.push);
        prop_assert!(!perm.push || perm.pull);
    }

    #[test]
    fn roll_up_ignores_order(states in prop::collection::vec(any_state(), 0..8)) {
        let forward: Vec<Status> = states.iter().copied().map(status).collect();
        let backward: Vec<Status> = states.iter().rev().copied().map(status).collect();
        prop_assert_eq!(
            CombinedStatus::roll_up("abc", forward).state,
            CombinedStatus::roll_up("abc", backward).state
        );
    }

    #[test]
    fn error_dominates_roll_up(states in prop::collection::vec(any_state(), 0..8)) {
        let mut statuses: Vec<Status> = states.into_iter().map(status).collect();
        statuses.push(status(State::Error));
        prop_assert_eq!(CombinedStatus::roll_up("abc", statuses).state, State::Error);
    }

    #[test]
    fn all_success_rolls_up_success(n in 1usize..8) {
        let statuses = vec![status(State::Success); n];
        prop_assert_eq!(CombinedStatus::roll_up("abc", statuses).state, State::Success);
    }

    #[test]
    fn repo_name_parses_display(ns in "[A-Za-z0-9_.-]{1,12}", name in "[A-Za-z0-9_.-]{1,20}") {
        let repo = RepoName::parse(&format!("{}/{}", ns, name)).unwrap();
        prop_assert_eq!(repo.namespace(), ns.as_str());
        prop_assert_eq!(repo.name(), name.as_str());
        prop_assert_eq!(RepoName::parse(&repo.to_string()).unwrap(), repo);
    }
}
