// ─── Version-Gated JVM Rules ───
// Each rule pairs a predicate over the runtime with the tokens it injects.
// Rules are evaluated in table order at build time.

use crate::core::java::RuntimeCapabilities;

pub const SECURITY_MANAGER_ARG: &str = "-secmgr";
pub const SECURITY_MANAGER_ALLOW_PROP: &str = "-Djava.security.manager=allow";

/// The module system stops needing the access table from this release on.
const MODULE_ACCESS_UNTIL: u32 = 24;
/// `java.base/com.sun.net.ssl.internal.ssl` disappeared after this release.
const LEGACY_SSL_OPENS_UNTIL: u32 = 12;

/// Inputs a rule may consult besides the runtime itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext {
    /// The topology ships its own module configuration (manifest driven).
    pub suppress_module_access: bool,
    pub security_manager_requested: bool,
}

pub struct JvmRule {
    pub name: &'static str,
    applies: fn(&RuntimeCapabilities, &RuleContext) -> bool,
    tokens: fn() -> Vec<String>,
}

impl JvmRule {
    pub fn applies(&self, capabilities: &RuntimeCapabilities, context: &RuleContext) -> bool {
        (self.applies)(capabilities, context)
    }

    pub fn tokens(&self) -> Vec<String> {
        (self.tokens)()
    }
}

fn module_access_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("--add-exports", "java.desktop/sun.awt"),
        ("--add-exports", "java.naming/com.sun.jndi.ldap"),
        ("--add-exports", "java.naming/com.sun.jndi.url.ldap"),
        ("--add-exports", "java.naming/com.sun.jndi.url.ldaps"),
        ("--add-exports", "jdk.naming.dns/com.sun.jndi.dns"),
        ("--add-opens", "java.base/java.lang"),
        ("--add-opens", "java.base/java.lang.invoke"),
        ("--add-opens", "java.base/java.lang.reflect"),
        ("--add-opens", "java.base/java.io"),
        ("--add-opens", "java.base/java.net"),
        ("--add-opens", "java.base/java.security"),
        ("--add-opens", "java.base/java.util"),
        ("--add-opens", "java.base/java.util.concurrent"),
        ("--add-opens", "java.management/javax.management"),
        ("--add-opens", "java.naming/javax.naming"),
    ]
}

fn module_access_tokens() -> Vec<String> {
    let mut tokens: Vec<String> = module_access_pairs()
        .into_iter()
        .map(|(flag, target)| format!("{flag}={target}=ALL-UNNAMED"))
        .collect();
    tokens.push("--add-modules=java.se".to_string());
    tokens
}

fn legacy_ssl_tokens() -> Vec<String> {
    vec!["--add-opens=java.base/com.sun.net.ssl.internal.ssl=ALL-UNNAMED".to_string()]
}

fn needs_module_access(capabilities: &RuntimeCapabilities, context: &RuleContext) -> bool {
    !context.suppress_module_access
        && capabilities.is_modular()
        && capabilities.major_version() < MODULE_ACCESS_UNTIL
}

/// Module access rules, category three of the command line.
pub static MODULE_ACCESS_RULES: &[JvmRule] = &[
    JvmRule {
        name: "module-access",
        applies: needs_module_access,
        tokens: module_access_tokens,
    },
    JvmRule {
        name: "legacy-ssl-opens",
        applies: |capabilities, context| {
            needs_module_access(capabilities, context)
                && capabilities.major_version() <= LEGACY_SSL_OPENS_UNTIL
        },
        tokens: legacy_ssl_tokens,
    },
];

/// Security manager rules, category four. At most one applies.
pub static SECURITY_MANAGER_RULES: &[JvmRule] = &[
    JvmRule {
        name: "enhanced-security-manager",
        applies: |capabilities, context| {
            context.security_manager_requested
                && capabilities.supports_enhanced_security_manager()
        },
        tokens: || vec![SECURITY_MANAGER_ALLOW_PROP.to_string()],
    },
    JvmRule {
        name: "legacy-security-manager",
        applies: |capabilities, context| {
            context.security_manager_requested
                && capabilities.supports_security_manager()
                && !capabilities.supports_enhanced_security_manager()
        },
        tokens: || vec![SECURITY_MANAGER_ARG.to_string()],
    },
];

/// Tokens of every rule in `rules` that applies, in table order.
pub fn evaluate(
    rules: &[JvmRule],
    capabilities: &RuntimeCapabilities,
    context: &RuleContext,
) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.applies(capabilities, context))
        .flat_map(JvmRule::tokens)
        .collect()
}
