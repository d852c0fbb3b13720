//! Recipes for JS/TS modules.

use super::{Change, Recipe, RecipeParams};
use crate::probe::{Signature, ValueShape};
use crate::transform::{
    ArraySpec, ArrayTarget, ElementMatch, ImportSpec, Patch, PropertySpec, WrapSpec,
};
use crate::value::{ConfigValue, RenderStyle};
use std::path::Path;

fn quoted(s: &str) -> String {
    RenderStyle::json().quote_string(s)
}

/// Wraps the Next.js config with `withSentryConfig`.
pub struct NextjsConfig;

impl Recipe for NextjsConfig {
    fn name(&self) -> &str {
        "nextjs-config"
    }

    fn description(&self) -> &str {
        "Wrap the Next.js config with withSentryConfig and set the build options"
    }

    fn default_path(&self) -> &str {
        "next.config.mjs"
    }

    fn signatures(&self, params: &RecipeParams) -> Vec<Signature> {
        vec![
            Signature::imports("@sentry/nextjs"),
            Signature::calls("withSentryConfig"),
            Signature::matches(format!(
                r#"org:\s*["']{}["']"#,
                regex::escape(params.org_or_placeholder())
            )),
        ]
    }

    fn change(&self, _path: &Path, params: &RecipeParams) -> Change {
        let options = ConfigValue::object([
            ("org", ConfigValue::string(params.org_or_placeholder())),
            ("project", ConfigValue::string(params.project_or_placeholder())),
            ("silent", ConfigValue::raw("!process.env.CI")),
        ]);
        Change::Code(vec![
            Patch::AddImport(ImportSpec::named("@sentry/nextjs", "withSentryConfig")),
            Patch::WrapDefaultExport(WrapSpec::new("withSentryConfig").trailing_arg(options).rewrap()),
        ])
    }
}

/// Registers the Sentry Vite plugin and turns on source maps.
pub struct ViteConfig;

impl Recipe for ViteConfig {
    fn name(&self) -> &str {
        "vite-config"
    }

    fn description(&self) -> &str {
        "Add sentryVitePlugin to the Vite plugins and enable build source maps"
    }

    fn default_path(&self) -> &str {
        "vite.config.ts"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![
            Signature::imports("@sentry/vite-plugin"),
            Signature::calls("sentryVitePlugin"),
            Signature::config_key(["build", "sourcemap"], ValueShape::Equals(true.into())),
        ]
    }

    fn change(&self, _path: &Path, params: &RecipeParams) -> Change {
        let plugin = format!(
            "sentryVitePlugin({{ org: {}, project: {} }})",
            quoted(params.org_or_placeholder()),
            quoted(params.project_or_placeholder()),
        );
        Change::Code(vec![
            Patch::AddImport(ImportSpec::default_import("@sentry/vite-plugin", "sentryVitePlugin")),
            Patch::AddArrayElement(ArraySpec {
                target: ArrayTarget::Property(vec!["plugins".to_string()]),
                elements: vec![ConfigValue::raw(plugin)],
                matching: ElementMatch::Callee,
            }),
            Patch::SetOrMergeProperty(PropertySpec::deep_merge(
                "build",
                ConfigValue::object([("sourcemap", true.into())]),
            )),
        ])
    }
}

const EXAMPLE_ROUTE: &str = "routes/sentry-example-page.tsx";

/// Adds the example page to a React Router route config.
pub struct ReactRouterRoutes;

impl Recipe for ReactRouterRoutes {
    fn name(&self) -> &str {
        "react-router-routes"
    }

    fn description(&self) -> &str {
        "Register the sentry-example-page route"
    }

    fn default_path(&self) -> &str {
        "app/routes.ts"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![Signature::contains(EXAMPLE_ROUTE)]
    }

    fn change(&self, _path: &Path, _params: &RecipeParams) -> Change {
        Change::Code(vec![
            Patch::AddImport(ImportSpec::named("@react-router/dev/routes", "route")),
            Patch::AddArrayElement(ArraySpec {
                target: ArrayTarget::DefaultExport,
                elements: vec![ConfigValue::raw(format!(
                    "route(\"sentry-example-page\", \"{EXAMPLE_ROUTE}\")"
                ))],
                matching: ElementMatch::Text,
            }),
        ])
    }
}

/// Wraps a Cloudflare Worker handler with `Sentry.withSentry`.
pub struct CloudflareWorker;

impl Recipe for CloudflareWorker {
    fn name(&self) -> &str {
        "cloudflare-worker"
    }

    fn description(&self) -> &str {
        "Wrap the worker's default export with Sentry.withSentry"
    }

    fn default_path(&self) -> &str {
        "src/index.ts"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![
            Signature::imports("@sentry/cloudflare"),
            Signature::calls("Sentry.withSentry"),
        ]
    }

    fn change(&self, _path: &Path, params: &RecipeParams) -> Change {
        let options = format!(
            "(env) => ({{ dsn: {}, tracesSampleRate: 1.0 }})",
            quoted(params.dsn_or_placeholder())
        );
        Change::Code(vec![
            Patch::AddImport(ImportSpec::namespace("@sentry/cloudflare", "Sentry")),
            Patch::WrapDefaultExport(WrapSpec::new("Sentry.withSentry").leading_arg(ConfigValue::raw(options))),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use tempfile::TempDir;

    fn run(recipe: &dyn Recipe, name: &str, src: &str, params: &RecipeParams) -> (String, bool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, src).unwrap();
        let outcome = recipe.run(&Driver::new().quiet(true), &path, params).unwrap();
        (std::fs::read_to_string(&path).unwrap(), outcome.is_applied())
    }

    #[test]
    fn test_nextjs_commonjs() {
        let params = RecipeParams::default().org("acme").project("web");
        let (out, applied) = run(
            &NextjsConfig,
            "next.config.js",
            "const nextConfig = {};\n\nmodule.exports = nextConfig;\n",
            &params,
        );
        assert!(applied);
        assert!(out.starts_with("const { withSentryConfig } = require(\"@sentry/nextjs\");\n"));
        assert!(out.contains("module.exports = withSentryConfig(nextConfig, {"));
        assert!(out.contains("silent: !process.env.CI"));
    }

    #[test]
    fn test_vite_config() {
        let params = RecipeParams::default().org("acme").project("web");
        let src = "import { defineConfig } from 'vite';\nimport react from '@vitejs/plugin-react';\n\nexport default defineConfig({\n  plugins: [react()],\n});\n";
        let (out, applied) = run(&ViteConfig, "vite.config.ts", src, &params);
        assert!(applied);
        assert!(out.contains("import sentryVitePlugin from '@sentry/vite-plugin';\n"));
        assert!(out.contains("sentryVitePlugin({ org: \"acme\", project: \"web\" })"));
        assert!(out.contains("sourcemap: true"));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vite.config.ts");
        std::fs::write(&path, &out).unwrap();
        let outcome = ViteConfig.run(&Driver::new().quiet(true), &path, &params).unwrap();
        assert!(outcome.is_already_configured());
    }

    #[test]
    fn test_react_router_routes() {
        let src = "import { index } from \"@react-router/dev/routes\";\n\nexport default [index(\"routes/home.tsx\")] satisfies RouteConfig;\n";
        let (out, applied) = run(&ReactRouterRoutes, "routes.ts", src, &RecipeParams::default());
        assert!(applied);
        assert!(out.starts_with("import { index, route } from \"@react-router/dev/routes\";\n"));
        assert!(out.contains("route(\"sentry-example-page\", \"routes/sentry-example-page.tsx\")] satisfies RouteConfig;"));
    }

    #[test]
    fn test_cloudflare_worker() {
        let src = "export default {\n  async fetch(request, env, ctx) {\n    return new Response('Hello');\n  },\n} satisfies ExportedHandler<Env>;\n";
        let params = RecipeParams::default().dsn("https://key@o0.ingest.sentry.io/0");
        let (out, applied) = run(&CloudflareWorker, "index.ts", src, &params);
        assert!(applied);
        assert!(out.starts_with("import * as Sentry from '@sentry/cloudflare';\n"));
        assert!(out.contains("export default Sentry.withSentry((env) => ({ dsn: \"https://key@o0.ingest.sentry.io/0\", tracesSampleRate: 1.0 }), {"));
        assert!(out.contains("satisfies ExportedHandler<Env>"));
    }
}
