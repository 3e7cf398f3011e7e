use serde::{Deserialize, Serialize};

/// Ties a code generator artifact to the annotations that trigger it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGeneratorBinding {
    pub name: String,
    /// `group:name` of the generator artifact.
    pub generator_coordinates: String,
    /// Fully qualified annotation names.
    pub annotations: Vec<String>,
}

impl CodeGeneratorBinding {
    pub fn new(name: &str, generator_coordinates: &str, annotations: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            generator_coordinates: generator_coordinates.to_string(),
            annotations: annotations.iter().map(|a| a.to_string()).collect(),
        }
    }
}

const DAGGER_ANNOTATIONS: [&str; 13] = [
    "javax.inject.Inject",
    "dagger.Binds",
    "dagger.Module",
    "dagger.multibindings.IntoMap",
    "dagger.multibindings.IntoSet",
    "dagger.BindsInstance",
    "dagger.Component",
    "dagger.assisted.Assisted",
    "dagger.assisted.AssistedInject",
    "dagger.assisted.AssistedFactory",
    "com.squareup.anvil.annotations.ContributesTo",
    "com.squareup.anvil.annotations.MergeComponent",
    "com.squareup.anvil.annotations.MergeSubcomponent",
];

const HILT_ANNOTATIONS: [&str; 3] = [
    "dagger.hilt.DefineComponent",
    "dagger.hilt.EntryPoint",
    "dagger.hilt.InstallIn",
];

/// Generators recognised without any configuration.
pub fn default_code_generators() -> Vec<CodeGeneratorBinding> {
    let hilt_android: Vec<&str> = HILT_ANNOTATIONS
        .iter()
        .copied()
        .chain([
            "dagger.hilt.android.AndroidEntryPoint",
            "dagger.hilt.android.HiltAndroidApp",
            "dagger.hilt.android.WithFragmentBindings",
        ])
        .collect();

    vec![
        CodeGeneratorBinding::new("Dagger", "com.google.dagger:dagger-compiler", &DAGGER_ANNOTATIONS),
        CodeGeneratorBinding::new(
            "Dagger Android",
            "com.google.dagger:dagger-android-processor",
            &["dagger.android.ContributesAndroidInjector"],
        ),
        CodeGeneratorBinding::new("Dagger Hilt", "com.google.dagger:hilt-compiler", &HILT_ANNOTATIONS),
        CodeGeneratorBinding::new("Dagger Hilt Android", "com.google.dagger:hilt-android-compiler", &hilt_android),
        CodeGeneratorBinding::new(
            "Moshi Kotlin codegen",
            "com.squareup.moshi:moshi-kotlin-codegen",
            &["com.squareup.moshi.Json", "com.squareup.moshi.JsonClass"],
        ),
        CodeGeneratorBinding::new("Room", "androidx.room:room-compiler", &["androidx.room.Database"]),
        CodeGeneratorBinding::new(
            "Roomigrant",
            "com.github.MatrixDev.Roomigrant:RoomigrantCompiler",
            &[
                "dev.matrix.roomigrant.GenerateRoomMigrations",
                "dev.matrix.roomigrant.rules.FieldMigrationRule",
                "dev.matrix.roomigrant.rules.OnMigrationEndRule",
                "dev.matrix.roomigrant.rules.OnMigrationStartRule",
            ],
        ),
        CodeGeneratorBinding::new(
            "AutoService",
            "com.google.auto.service:auto-service",
            &["com.google.auto.service.AutoService"],
        ),
        CodeGeneratorBinding::new(
            "AutoService (KSP)",
            "dev.zacsweers.autoservice:compiler",
            &["com.google.auto.service.AutoService"],
        ),
        CodeGeneratorBinding::new(
            "AutoFactory",
            "com.google.auto.factory:auto-factory",
            &["com.google.auto.factory.AutoFactory"],
        ),
        CodeGeneratorBinding::new(
            "Inflation Inject (Square)",
            "com.squareup.inject:inflation-inject-processor",
            &[
                "com.squareup.inject.inflation.InflationInject",
                "com.squareup.inject.inflation.InflationInjectModule",
            ],
        ),
        CodeGeneratorBinding::new(
            "Inflation Inject (Cash App)",
            "app.cash.inject:inflation-inject-processor",
            &[
                "app.cash.inject.inflation.InflationInject",
                "app.cash.inject.inflation.InflationModule",
                "app.cash.inject.inflation.ViewFactory",
            ],
        ),
        CodeGeneratorBinding::new(
            "Assisted Inject",
            "com.squareup.inject:assisted-inject-processor",
            &[
                "com.squareup.inject.assisted.AssistedInject",
                "com.squareup.inject.assisted.AssistedInject.Factory",
                "com.squareup.inject.assisted.Assisted",
            ],
        ),
        CodeGeneratorBinding::new(
            "Assisted Inject Dagger",
            "com.squareup.inject:assisted-inject-processor-dagger2",
            &["com.squareup.inject.assisted.dagger2.AssistedModule"],
        ),
        CodeGeneratorBinding::new(
            "Gradle Incap Helper",
            "net.ltgt.gradle.incap:incap-processor",
            &["net.ltgt.gradle.incap.IncrementalAnnotationProcessor"],
        ),
        CodeGeneratorBinding::new(
            "Epoxy",
            "com.airbnb.android:epoxy-processor",
            &[
                "com.airbnb.epoxy.AfterPropsSet",
                "com.airbnb.epoxy.AutoModel",
                "com.airbnb.epoxy.CallbackProp",
                "com.airbnb.epoxy.EpoxyAttribute",
                "com.airbnb.epoxy.EpoxyDataBindingLayouts",
                "com.airbnb.epoxy.EpoxyDataBindingPattern",
                "com.airbnb.epoxy.EpoxyModelClass",
                "com.airbnb.epoxy.ModelProp",
                "com.airbnb.epoxy.ModelView",
                "com.airbnb.epoxy.OnViewRecycled",
                "com.airbnb.epoxy.OnVisibilityChanged",
                "com.airbnb.epoxy.OnVisibilityStateChanged",
                "com.airbnb.epoxy.PackageEpoxyConfig",
                "com.airbnb.epoxy.PackageModelViewConfig",
                "com.airbnb.epoxy.TextProp",
            ],
        ),
    ]
}
