use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use chrono::Utc;
use guildhall_auth::{AuthConfig, PlatformRole, SessionTokens};
use guildhall_core::{CommunityId, UserId};

fn config() -> AuthConfig {
    AuthConfig::new(
        "guildhall-bench",
        "access-secret-for-bench-0123456789abcdef",
        "refresh-secret-for-bench-0123456789abcdef",
        "action-secret-for-bench-0123456789abcdef",
    )
}

fn bench_issue(c: &mut Criterion) {
    let sessions = SessionTokens::new(&config()).unwrap();
    let user = UserId::parse("bench-user").unwrap();
    let community = CommunityId::parse("bench-community").unwrap();

    let mut group = c.benchmark_group("session_issue");
    group.bench_function("no_community", |b| {
        b.iter(|| {
            sessions
                .login(black_box(user.clone()), PlatformRole::Member, None, Utc::now())
                .unwrap()
        });
    });
    group.bench_function("with_community", |b| {
        b.iter(|| {
            sessions
                .login(
                    black_box(user.clone()),
                    PlatformRole::Member,
                    Some(community.clone()),
                    Utc::now(),
                )
                .unwrap()
        });
    });
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let sessions = SessionTokens::new(&config()).unwrap();
    let now = Utc::now();
    let pair = sessions
        .login(UserId::parse("bench-user").unwrap(), PlatformRole::Admin, None, now)
        .unwrap();

    let mut tampered = pair.access_token.clone().into_bytes();
    let last = tampered.len() - 2;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let mut group = c.benchmark_group("access_validate");
    for (name, token) in [("valid", &pair.access_token), ("tampered", &tampered)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), token, |b, token| {
            b.iter(|| {
                let _ = sessions.validate_access(black_box(token), now);
            });
        });
    }
    group.finish();
}

fn bench_refresh(c: &mut Criterion) {
    let sessions = SessionTokens::new(&config()).unwrap();
    let now = Utc::now();
    let pair = sessions
        .login(UserId::parse("bench-user").unwrap(), PlatformRole::Member, None, now)
        .unwrap();

    c.bench_function("session_refresh", |b| {
        b.iter(|| sessions.refresh(black_box(&pair.refresh_token), now).unwrap());
    });
}

criterion_group!(benches, bench_issue, bench_validate, bench_refresh);
criterion_main!(benches);
