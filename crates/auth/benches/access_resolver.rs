use criterion::{Criterion, black_box, criterion_group, criterion_main};

use bazaar_auth::{
    AccessPolicy, FinanceAction, Permission, PermissionSet, Role, SalesAction, User, has_access,
    has_access_by_key,
};

fn policy_for(user: &User) -> AccessPolicy {
    AccessPolicy::new()
        .with_user(user.id, PermissionSet::new().deny(FinanceAction::ApproveExpenseRequest))
        .with_role(
            Role::Cashier,
            PermissionSet::new().allow(SalesAction::CreateSale).allow(SalesAction::ViewSales),
        )
}

fn bench_resolution(c: &mut Criterion) {
    let user = User::new("bench", Role::Cashier);
    let policy = policy_for(&user);

    c.bench_function("has_access/role_default", |b| {
        b.iter(|| {
            has_access(
                black_box(Some(&user)),
                black_box(Permission::Sales(SalesAction::CreateSale)),
                &policy,
                false,
            )
        })
    });

    c.bench_function("has_access/full_catalog_scan", |b| {
        let all = Permission::all();
        b.iter(|| all.iter().filter(|p| has_access(Some(&user), **p, &policy, false)).count())
    });

    c.bench_function("has_access_by_key/boundary", |b| {
        b.iter(|| has_access_by_key(Some(&user), black_box("SALES"), black_box("Create_Sale"), &policy, false))
    });
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
