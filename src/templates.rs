use tera::Tera;

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../templates/", $name)))
    };
}

/// Loads the page and email templates bundled into the binary.
pub fn load() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        template!("imagersite/base.html"),
        template!("imagersite/_form_fields.html"),
        template!("imagersite/home.html"),
        template!("imagersite/login.html"),
        template!("imagersite/profile.html"),
        template!("imagersite/profile_edit.html"),
        template!("registration/registration_form.html"),
        template!("registration/registration_complete.html"),
        template!("registration/registration_closed.html"),
        template!("registration/activate.html"),
        template!("registration/activation_complete.html"),
        template!("registration/activation_email.txt"),
    ])?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::load;
    use tera::Context;

    #[test]
    fn home_extends_base() {
        let tera = load().unwrap();
        let mut ctx = Context::new();
        ctx.insert("user", &Option::<()>::None);
        let html = tera.render("imagersite/home.html", &ctx).unwrap();
        assert!(html.contains("Djimager home page."));
        assert!(html.contains(r#"<a href="/login/">"#));
    }

    #[test]
    fn activation_email_puts_the_link_in_its_own_paragraph() {
        let tera = load().unwrap();
        let mut ctx = Context::new();
        ctx.insert("scheme", "http");
        ctx.insert("site", "testserver");
        ctx.insert("activation_key", "abc.def.ghi");
        ctx.insert("expiration_days", &7);
        let body = tera.render("registration/activation_email.txt", &ctx).unwrap();
        assert!(body.starts_with("\n\nActivate account at testserver:\n\nhttp://testserver/accounts/activate/"));
        let link = body.split("\n\n").nth(2).unwrap();
        assert_eq!(link, "http://testserver/accounts/activate/abc.def.ghi/");
    }
}
