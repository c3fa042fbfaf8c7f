use cucumber::{given, then, when};

use super::{LegaWorld, check};

#[given(regex = r"^I am a user$")]
fn i_am_a_user(world: &mut LegaWorld) {
    world.steps.i_am_a_user(&mut world.ctx);
}

#[given(regex = r"^I have an account at Central EGA$")]
async fn i_have_an_account_at_central_ega(world: &mut LegaWorld) {
    world
        .steps
        .i_have_an_account_at_central_ega(&mut world.ctx)
        .await;
}

#[given(regex = r"^I have correct private key$")]
fn i_have_correct_private_key(world: &mut LegaWorld) {
    check(world.steps.i_have_correct_private_key(&mut world.ctx));
}

#[given(regex = r"^I have incorrect private key$")]
fn i_have_incorrect_private_key(world: &mut LegaWorld) {
    world.steps.i_have_incorrect_private_key(&mut world.ctx);
}

#[when(regex = r"^my account expires$")]
async fn my_account_expires(world: &mut LegaWorld) {
    world.steps.my_account_expires(&mut world.ctx).await;
}

#[when(regex = r"^I connect to the LocalEGA inbox via SFTP using private key$")]
async fn i_connect_with_private_key(world: &mut LegaWorld) {
    check(world.steps.i_connect_with_private_key(&mut world.ctx).await);
}

#[then(regex = r"^I am in the local database$")]
async fn i_am_in_the_local_database(world: &mut LegaWorld) {
    check(world.steps.i_am_in_the_local_database(&world.ctx).await);
}

#[then(regex = r"^I am not in the local database$")]
async fn i_am_not_in_the_local_database(world: &mut LegaWorld) {
    check(world.steps.i_am_not_in_the_local_database(&world.ctx).await);
}

#[then(regex = r"^I'm logged in successfully$")]
fn i_am_logged_in_successfully(world: &mut LegaWorld) {
    check(world.steps.i_am_logged_in_successfully(&world.ctx));
}

#[then(regex = r"^authentication fails$")]
fn authentication_fails(world: &mut LegaWorld) {
    check(world.steps.authentication_fails(&world.ctx));
}
