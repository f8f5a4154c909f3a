use calmform::form::{FieldKey, FormModel};

#[allow(dead_code)]
#[derive(Clone, calmform::form::FormModel)]
struct DemoForm {
    email: String,
    #[form(nested)]
    address: Address,
    #[form(rename = "zip")]
    postal_code: String,
}

#[allow(dead_code)]
#[derive(Clone, calmform::form::FormModel)]
struct Address {
    street: String,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(fields.address(), FieldKey::new("address"));
    assert_eq!(fields.address_fields().street().as_str(), "address.street");
    assert_eq!(fields.postal_code().as_str(), "zip");
}
