//! Address commands, run through the address form like the interactive
//! view does.

use addressbook_core::AddressId;

use super::{View, format_address, print_line, require_user};
use crate::AddressFieldArgs;
use crate::error::CliError;

/// Add an address from the given fields.
pub async fn add(view: &View, fields: &AddressFieldArgs) -> Result<(), CliError> {
    require_user(view).await?;

    view.start_add();
    fill_form(view, fields)?;
    let created = view.submit_form().await?;

    print_line(&format!("Added {}", format_address(&created)));
    Ok(())
}

/// Edit an address; fields not given keep their current value.
pub async fn edit(view: &View, id: u64, fields: &AddressFieldArgs) -> Result<(), CliError> {
    require_user(view).await?;

    view.start_edit(AddressId::new(id)).await?;
    fill_form(view, fields)?;
    let saved = view.submit_form().await?;

    print_line(&format!("Updated {}", format_address(&saved)));
    Ok(())
}

/// Delete an address.
pub async fn delete(view: &View, id: u64) -> Result<(), CliError> {
    require_user(view).await?;

    let id = AddressId::new(id);
    view.delete_address(id).await?;

    print_line(&format!("Deleted address {id}"));
    Ok(())
}

fn fill_form(view: &View, fields: &AddressFieldArgs) -> Result<(), CliError> {
    for (name, value) in fields.provided() {
        view.set_field(name, value)?;
    }
    Ok(())
}
