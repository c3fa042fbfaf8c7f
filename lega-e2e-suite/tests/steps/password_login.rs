use cucumber::{given, then, when};

use super::{LegaWorld, check};

#[given(regex = r"^I have username and password$")]
async fn i_have_username_and_password(world: &mut LegaWorld) {
    check(world.steps.i_have_username_and_password(&mut world.ctx).await);
}

#[when(regex = r"^I try to connect to the LocalEGA inbox via SFTP using these credentials$")]
async fn i_connect_with_password(world: &mut LegaWorld) {
    check(world.steps.i_connect_with_password(&mut world.ctx).await);
}

#[then(regex = r"^the operation is successful$")]
async fn the_operation_is_successful(world: &mut LegaWorld) {
    check(world.steps.the_operation_is_successful(&mut world.ctx).await);
}
