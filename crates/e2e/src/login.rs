//! Login page object

use tracing::info;

use crate::error::E2eResult;
use crate::i18n::{Locale, Translations};
use crate::page::{ByRole, Locator, Page};

pub struct LoginPage<'a> {
    page: &'a dyn Page,
    translations: &'a Translations,
    locale: Locale,
}

impl<'a> LoginPage<'a> {
    pub fn new(page: &'a dyn Page, translations: &'a Translations, locale: Locale) -> Self {
        Self {
            page,
            translations,
            locale,
        }
    }

    fn label(&self, key: &str) -> String {
        self.translations.translate(self.locale, key)
    }

    /// Validation message shown for rejected credentials
    pub fn error_message(&self) -> Locator {
        Locator::css(r#"[data-testid="login-page-error-message"]"#)
    }

    pub async fn login(&self, user: &str, password: &str) -> E2eResult<()> {
        info!("Logging in as '{}' ({})", user, self.locale);

        self.page.click(&Locator::css(".container-user > .btn-ci")).await?;
        self.page
            .click(&Locator::role(ByRole::new("button").name(self.label("LOGIN.BTN_ACCESO"))).first())
            .await?;
        self.page
            .fill(
                &Locator::role(ByRole::new("textbox").name(self.label("LOGIN.LOGIN_USER"))).first(),
                user,
            )
            .await?;
        self.page
            .fill(
                &Locator::role(ByRole::new("textbox").name(self.label("LOGIN.LOGIN_PASSWORD"))).first(),
                password,
            )
            .await?;
        self.page
            .click(&Locator::role(ByRole::new("button").name(self.label("LOGIN.ENTRAR"))).first())
            .await?;
        Ok(())
    }

    pub async fn has_error(&self) -> E2eResult<bool> {
        self.page.is_visible(&self.error_message()).await
    }
}
